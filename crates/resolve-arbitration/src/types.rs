//! Common types for arbitration providers

use chrono::{DateTime, Utc};
use resolve_types::{ClaimType, EvidenceKind, PartyRole, Ruling};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while invoking the ruling capability
#[derive(Error, Debug)]
pub enum RulingError {
    #[error("Provider not available: {provider}")]
    ProviderNotAvailable { provider: String },

    #[error("Request failed: {message}")]
    RequestFailed { message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },
}

pub type RulingResult<T> = std::result::Result<T, RulingError>;

/// One evidence entry as presented to the ruling capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Which side submitted it
    pub submitted_as: PartyRole,
    /// Kind of evidence
    pub kind: EvidenceKind,
    /// Caller-supplied title
    pub title: String,
    /// Normalized text content
    pub content: String,
    /// Submission time, used for ordering
    pub submitted_at: DateTime<Utc>,
}

/// Everything the ruling capability sees about a dispute
///
/// The engine is stateless between calls; all state lives on the dispute and
/// evidence entities this context is assembled from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrationContext {
    /// Dispute reference, for logging only
    pub dispute_ref: String,
    /// Nature of the claim
    pub claim_type: ClaimType,
    /// Short statement of the claim
    pub claim_summary: String,
    /// Full narrative of the claim
    pub claim_details: String,
    /// What the claimant wants
    pub requested_resolution: String,
    /// Monetary value of the underlying transaction, smallest currency unit
    pub stated_value_cents: i64,
    /// Evidence in submission order
    pub evidence: Vec<EvidenceItem>,
    /// Calibration notes derived from historical metrics; may be empty
    pub calibration_notes: String,
}

impl ArbitrationContext {
    /// Count of evidence entries submitted by one side
    pub fn evidence_count(&self, role: PartyRole) -> usize {
        self.evidence
            .iter()
            .filter(|e| e.submitted_as == role)
            .count()
    }
}

/// Structured outcome of a ruling call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulingOutcome {
    /// The ruling
    pub ruling: Ruling,
    /// Model confidence in [0.0, 1.0]
    pub confidence: f64,
    /// Factors the decision turned on
    pub key_factors: Vec<String>,
    /// Narrative reasoning
    pub reasoning: String,
}

/// Wire shape the capability must answer with
#[derive(Debug, Deserialize)]
pub(crate) struct RawRulingResponse {
    pub ruling: String,
    pub confidence: f64,
    #[serde(default)]
    pub key_factors: Vec<String>,
    pub reasoning: String,
}

/// Parse the capability's JSON answer into a validated outcome
pub fn parse_ruling_json(content: &str) -> RulingResult<RulingOutcome> {
    // Some models wrap JSON in a code fence despite instructions
    let trimmed = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let raw: RawRulingResponse =
        serde_json::from_str(trimmed).map_err(|e| RulingError::InvalidResponse {
            message: format!("malformed ruling JSON: {}", e),
        })?;

    let ruling = match raw.ruling.to_uppercase().as_str() {
        "CLAIMANT" => Ruling::Claimant,
        "RESPONDENT" => Ruling::Respondent,
        "SPLIT" => Ruling::Split,
        "DISMISSED" => Ruling::Dismissed,
        other => {
            return Err(RulingError::InvalidResponse {
                message: format!("unknown ruling value: {}", other),
            })
        }
    };

    if !(0.0..=1.0).contains(&raw.confidence) {
        return Err(RulingError::InvalidResponse {
            message: format!("confidence {} outside [0,1]", raw.confidence),
        });
    }

    Ok(RulingOutcome {
        ruling,
        confidence: raw.confidence,
        key_factors: raw.key_factors,
        reasoning: raw.reasoning,
    })
}
