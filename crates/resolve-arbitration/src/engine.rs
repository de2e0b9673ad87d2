//! Arbitration engine
//!
//! Assembles the arbitration context from dispute and evidence entities,
//! invokes the ruling provider, and validates the outcome. Stateless between
//! calls; the caller owns persistence and must not hold a store lock while
//! this runs.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::providers::RulingProvider;
use crate::types::{ArbitrationContext, EvidenceItem, RulingOutcome};
use resolve_types::{Evidence, ResolveDispute, ResolveError, Result};

/// Source of calibration notes injected into arbitration prompts
///
/// Implemented by the metrics subsystem; an empty string means "no
/// calibration available" and is never an error.
#[async_trait]
pub trait CalibrationSource: Send + Sync {
    async fn calibration_context(&self) -> String;
}

/// Calibration source that never has anything to say
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCalibration;

#[async_trait]
impl CalibrationSource for NoCalibration {
    async fn calibration_context(&self) -> String {
        String::new()
    }
}

/// The arbitration engine
#[derive(Clone)]
pub struct ArbitrationEngine {
    provider: Arc<dyn RulingProvider>,
}

impl ArbitrationEngine {
    pub fn new(provider: Arc<dyn RulingProvider>) -> Self {
        Self { provider }
    }

    /// Name of the backing provider
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Assemble the context a ruling call sees
    pub fn build_context(
        dispute: &ResolveDispute,
        evidence: &[Evidence],
        calibration_notes: String,
    ) -> ArbitrationContext {
        let mut items: Vec<EvidenceItem> = evidence
            .iter()
            .map(|e| EvidenceItem {
                submitted_as: e.submitted_as,
                kind: e.kind,
                title: e.title.clone(),
                content: e.content.clone(),
                submitted_at: e.submitted_at,
            })
            .collect();
        // Arbitration input is ordered by submission time ascending
        items.sort_by_key(|e| e.submitted_at);

        ArbitrationContext {
            dispute_ref: dispute.id.to_string(),
            claim_type: dispute.claim_type,
            claim_summary: dispute.claim_summary.clone(),
            claim_details: dispute.claim_details.clone(),
            requested_resolution: dispute.requested_resolution.clone(),
            stated_value_cents: dispute.stated_value_cents,
            evidence: items,
            calibration_notes,
        }
    }

    /// Decide a dispute
    ///
    /// Provider failures surface as `ArbitrationUnavailable`; the dispute is
    /// never silently auto-ruled.
    pub async fn rule(
        &self,
        dispute: &ResolveDispute,
        evidence: &[Evidence],
        calibration_notes: String,
    ) -> Result<RulingOutcome> {
        let context = Self::build_context(dispute, evidence, calibration_notes);

        let outcome = self.provider.rule(&context).await.map_err(|e| {
            warn!(dispute = %dispute.id, provider = self.provider.name(), error = %e, "ruling capability failed");
            ResolveError::ArbitrationUnavailable {
                reason: e.to_string(),
            }
        })?;

        info!(
            dispute = %dispute.id,
            ruling = %outcome.ruling,
            confidence = outcome.confidence,
            "ruling issued"
        );
        Ok(outcome)
    }
}
