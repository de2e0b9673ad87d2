//! Ruling provider implementations

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::prompt::{dispute_prompt, system_prompt};
use crate::types::{
    parse_ruling_json, ArbitrationContext, RulingError, RulingOutcome, RulingResult,
};
use resolve_types::{PartyRole, Ruling};

/// Trait for ruling providers
///
/// The AI ruling capability is a black box behind this seam: given the full
/// dispute context it returns a structured ruling, or fails. Providers must
/// never invent a ruling on failure.
#[async_trait]
pub trait RulingProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &'static str;

    /// Check if the provider is reachable
    async fn is_available(&self) -> bool;

    /// Decide a dispute
    async fn rule(&self, context: &ArbitrationContext) -> RulingResult<RulingOutcome>;
}

// ============================================================================
// HTTP Provider (OpenAI-compatible, default)
// ============================================================================

/// Configuration for the HTTP ruling provider
#[derive(Debug, Clone)]
pub struct HttpRulingConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for HttpRulingConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("RESOLVE_ARBITER_URL")
                .unwrap_or_else(|_| "http://localhost:11434/v1".to_string()),
            model: std::env::var("RESOLVE_ARBITER_MODEL")
                .unwrap_or_else(|_| "llama3.1:8b".to_string()),
            api_key: std::env::var("RESOLVE_ARBITER_API_KEY").ok(),
            temperature: 0.1,
            max_tokens: 1024,
        }
    }
}

/// Ruling provider speaking the OpenAI-compatible chat completion protocol
///
/// Works against any compatible endpoint (Ollama, vLLM, hosted APIs).
pub struct HttpRulingProvider {
    config: HttpRulingConfig,
    client: reqwest::Client,
}

impl HttpRulingProvider {
    pub fn new(config: HttpRulingConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(HttpRulingConfig::default())
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[async_trait]
impl RulingProvider for HttpRulingProvider {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/models", self.config.base_url);
        self.client.get(&url).send().await.is_ok()
    }

    async fn rule(&self, context: &ArbitrationContext) -> RulingResult<RulingOutcome> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt(context),
                },
                ChatMessage {
                    role: "user",
                    content: dispute_prompt(context),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let url = format!("{}/chat/completions", self.config.base_url);
        let mut builder = self.client.post(&url).json(&request);
        if let Some(ref key) = self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| RulingError::NetworkError {
            message: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(RulingError::RequestFailed {
                message: format!("HTTP {}", response.status()),
            });
        }

        let chat: ChatResponse =
            response.json().await.map_err(|e| RulingError::InvalidResponse {
                message: e.to_string(),
            })?;

        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| RulingError::InvalidResponse {
                message: "empty choices".to_string(),
            })?;

        debug!(dispute = %context.dispute_ref, "ruling capability answered");
        parse_ruling_json(content)
    }
}

// ============================================================================
// Deterministic Provider (fallback, no model required)
// ============================================================================

/// Deterministic fallback provider
///
/// Decides from the shape of the evidence alone: the side that substantiated
/// its position prevails; silence from both sides dismisses the claim. Useful
/// for demos, tests, and degraded operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicRulingProvider;

impl DeterministicRulingProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RulingProvider for DeterministicRulingProvider {
    fn name(&self) -> &'static str {
        "deterministic"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn rule(&self, context: &ArbitrationContext) -> RulingResult<RulingOutcome> {
        let claimant_count = context.evidence_count(PartyRole::Claimant);
        let respondent_count = context.evidence_count(PartyRole::Respondent);

        let (ruling, confidence, factor) = if claimant_count == 0 && respondent_count == 0 {
            (
                Ruling::Dismissed,
                0.6,
                "no evidence submitted by either party",
            )
        } else if claimant_count > respondent_count {
            (
                Ruling::Claimant,
                0.7,
                "claimant substantiated the claim more fully",
            )
        } else if respondent_count > claimant_count {
            (
                Ruling::Respondent,
                0.7,
                "respondent substantiated its position more fully",
            )
        } else {
            (Ruling::Split, 0.5, "evidence weighs evenly on both sides")
        };

        Ok(RulingOutcome {
            ruling,
            confidence,
            key_factors: vec![factor.to_string()],
            reasoning: format!(
                "Deterministic evaluation: {} claimant and {} respondent evidence entries. {}.",
                claimant_count, respondent_count, factor
            ),
        })
    }
}
