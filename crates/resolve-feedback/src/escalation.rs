//! Escalation desk
//!
//! Routes disputes to human arbitrators and records how humans ruled
//! relative to the AI. At most one escalation exists per dispute; a second
//! request is a no-op returning the existing record.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;

use resolve_audit::{AuditAction, AuditLog};
use resolve_dispute::DisputeLifecycle;
use resolve_types::{
    AccuracyComparison, AgentId, ComparisonId, DisputeId, Escalation, EscalationId,
    EscalationStatus, ResolveError, Result, Ruling,
};

/// The escalation desk
#[derive(Clone)]
pub struct EscalationDesk {
    lifecycle: DisputeLifecycle,
    escalations: Arc<RwLock<HashMap<DisputeId, Escalation>>>,
    comparisons: Arc<RwLock<Vec<AccuracyComparison>>>,
    audit: Arc<dyn AuditLog>,
}

impl EscalationDesk {
    pub fn new(lifecycle: DisputeLifecycle, audit: Arc<dyn AuditLog>) -> Self {
        Self {
            lifecycle,
            escalations: Arc::new(RwLock::new(HashMap::new())),
            comparisons: Arc::new(RwLock::new(Vec::new())),
            audit,
        }
    }

    /// Request escalation of a ruled dispute
    ///
    /// Idempotent per dispute: once an escalation exists, further requests
    /// return it unchanged. `requested_by` is absent for the low-confidence
    /// auto-trigger.
    pub async fn request_escalation(
        &self,
        dispute_id: &DisputeId,
        requested_by: Option<&AgentId>,
        reason: impl Into<String>,
    ) -> Result<Escalation> {
        {
            let escalations = self.escalations.read().await;
            if let Some(existing) = escalations.get(dispute_id) {
                return Ok(existing.clone());
            }
        }

        // The lifecycle validates state and party membership
        self.lifecycle.escalate(dispute_id, requested_by).await?;

        let escalation = {
            let mut escalations = self.escalations.write().await;
            // A concurrent request may have won the race
            if let Some(existing) = escalations.get(dispute_id) {
                existing.clone()
            } else {
                let escalation = Escalation {
                    id: EscalationId::new(),
                    dispute_id: dispute_id.clone(),
                    requested_by: requested_by.cloned(),
                    reason: reason.into(),
                    status: EscalationStatus::Pending,
                    arbitrator_ruling: None,
                    arbitrator_reasoning: None,
                    requested_at: Utc::now(),
                    resolved_at: None,
                };
                escalations.insert(dispute_id.clone(), escalation.clone());
                escalation
            }
        };

        self.audit
            .record(
                requested_by.cloned(),
                AuditAction::DisputeEscalated {
                    dispute_id: dispute_id.clone(),
                    escalation_id: escalation.id.clone(),
                },
            )
            .await?;

        info!(dispute = %dispute_id, escalation = %escalation.id, "escalation requested");
        Ok(escalation)
    }

    /// The escalation for a dispute, if any
    pub async fn get_escalation(&self, dispute_id: &DisputeId) -> Result<Escalation> {
        self.escalations
            .read()
            .await
            .get(dispute_id)
            .cloned()
            .ok_or_else(|| ResolveError::EscalationNotFound {
                dispute_id: dispute_id.to_string(),
            })
    }

    /// Record a human arbitrator's ruling
    ///
    /// Closes the dispute with the human ruling binding and, when an AI
    /// ruling exists, writes an immutable accuracy comparison.
    pub async fn resolve_escalation(
        &self,
        dispute_id: &DisputeId,
        human_ruling: Ruling,
        reasoning: impl Into<String>,
    ) -> Result<Escalation> {
        {
            let escalations = self.escalations.read().await;
            let escalation = escalations.get(dispute_id).ok_or_else(|| {
                ResolveError::EscalationNotFound {
                    dispute_id: dispute_id.to_string(),
                }
            })?;
            if escalation.status == EscalationStatus::Resolved {
                return Err(ResolveError::EscalationAlreadyResolved {
                    escalation_id: escalation.id.to_string(),
                });
            }
        }

        // Snapshot the AI ruling before the lifecycle overwrites it with the
        // binding human ruling
        let dispute = self.lifecycle.get_dispute(dispute_id).await?;
        let ai_ruling = dispute.ruling;
        let ai_details = dispute.ruling_details.clone();

        self.lifecycle
            .close_escalated(dispute_id, human_ruling)
            .await?;

        let reasoning = reasoning.into();
        let escalation = {
            let mut escalations = self.escalations.write().await;
            let escalation = escalations.get_mut(dispute_id).ok_or_else(|| {
                ResolveError::EscalationNotFound {
                    dispute_id: dispute_id.to_string(),
                }
            })?;
            escalation.status = EscalationStatus::Resolved;
            escalation.arbitrator_ruling = Some(human_ruling);
            escalation.arbitrator_reasoning = Some(reasoning);
            escalation.resolved_at = Some(Utc::now());
            escalation.clone()
        };

        if let Some(ai_ruling) = ai_ruling {
            let comparison = AccuracyComparison {
                id: ComparisonId::new(),
                dispute_id: dispute_id.clone(),
                escalation_id: escalation.id.clone(),
                ai_ruling,
                human_ruling,
                ai_confidence: ai_details.as_ref().map(|d| d.confidence).unwrap_or(0.0),
                ai_key_factors: ai_details.map(|d| d.key_factors).unwrap_or_default(),
                ruling_agreed: ai_ruling == human_ruling,
                created_at: Utc::now(),
            };
            info!(
                dispute = %dispute_id,
                agreed = comparison.ruling_agreed,
                "accuracy comparison recorded"
            );
            self.comparisons.write().await.push(comparison);
        }

        self.audit
            .record(
                None,
                AuditAction::EscalationResolved {
                    escalation_id: escalation.id.clone(),
                    ruling: human_ruling,
                },
            )
            .await?;

        Ok(escalation)
    }

    /// Whether a dispute has been escalated
    pub async fn is_escalated(&self, dispute_id: &DisputeId) -> bool {
        self.escalations.read().await.contains_key(dispute_id)
    }

    /// Accuracy comparisons recorded inside a half-open window
    pub async fn comparisons_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<AccuracyComparison> {
        self.comparisons
            .read()
            .await
            .iter()
            .filter(|c| c.created_at >= start && c.created_at < end)
            .cloned()
            .collect()
    }

    /// The comparison for one dispute, if recorded
    pub async fn comparison_for(&self, dispute_id: &DisputeId) -> Option<AccuracyComparison> {
        self.comparisons
            .read()
            .await
            .iter()
            .find(|c| &c.dispute_id == dispute_id)
            .cloned()
    }
}
