//! Decision feedback
//!
//! Parties rate closed decisions inside a 30-day window. One entry per
//! (dispute, agent) pair; `was_winner` is derived from the binding ruling.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::info;

use resolve_dispute::DisputeLifecycle;
use resolve_types::{
    AgentId, DecisionFeedback, DisputeId, DisputeStatus, FeedbackId, FeedbackRatings,
    ResolveError, Result,
};

/// Collects post-resolution feedback from dispute parties
#[derive(Clone)]
pub struct FeedbackDesk {
    lifecycle: DisputeLifecycle,
    entries: Arc<RwLock<HashMap<(DisputeId, AgentId), DecisionFeedback>>>,
}

impl FeedbackDesk {
    pub fn new(lifecycle: DisputeLifecycle) -> Self {
        Self {
            lifecycle,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Submit feedback on a closed dispute
    pub async fn submit_feedback(
        &self,
        dispute_id: &DisputeId,
        agent_id: &AgentId,
        ratings: FeedbackRatings,
        comment: Option<String>,
    ) -> Result<DecisionFeedback> {
        ratings.validate()?;

        let dispute = self.lifecycle.get_dispute(dispute_id).await?;
        let role = dispute.role_of(agent_id)?;

        if dispute.status != DisputeStatus::Closed {
            return Err(ResolveError::InvalidDisputeState {
                dispute_id: dispute_id.to_string(),
                status: dispute.status.to_string(),
                action: "submit feedback for".to_string(),
            });
        }

        let closed_at = dispute.closed_at.ok_or_else(|| ResolveError::DataIntegrity {
            message: format!("closed dispute {} has no closed_at", dispute_id),
        })?;
        let window_days = self.lifecycle.config().feedback_window_days;
        let window_closes = closed_at + Duration::days(window_days);
        if Utc::now() > window_closes {
            return Err(ResolveError::FeedbackWindowClosed {
                dispute_id: dispute_id.to_string(),
                window_closed_at: window_closes.to_rfc3339(),
            });
        }

        let ruling = dispute.ruling.ok_or_else(|| ResolveError::DataIntegrity {
            message: format!("closed dispute {} has no ruling", dispute_id),
        })?;

        let feedback = {
            let mut entries = self.entries.write().await;
            let key = (dispute_id.clone(), agent_id.clone());
            if entries.contains_key(&key) {
                return Err(ResolveError::FeedbackAlreadySubmitted {
                    dispute_id: dispute_id.to_string(),
                    agent_id: agent_id.to_string(),
                });
            }

            let feedback = DecisionFeedback {
                id: FeedbackId::new(),
                dispute_id: dispute_id.clone(),
                agent_id: agent_id.clone(),
                party_role: role,
                was_winner: ruling.is_winner(role),
                ratings,
                comment,
                submitted_at: Utc::now(),
            };
            entries.insert(key, feedback.clone());
            feedback
        };

        info!(
            dispute = %dispute_id,
            role = %feedback.party_role,
            winner = feedback.was_winner,
            "decision feedback recorded"
        );
        Ok(feedback)
    }

    /// All feedback concerning a set of disputes
    pub async fn feedback_for_disputes(&self, dispute_ids: &[DisputeId]) -> Vec<DecisionFeedback> {
        let entries = self.entries.read().await;
        entries
            .values()
            .filter(|f| dispute_ids.contains(&f.dispute_id))
            .cloned()
            .collect()
    }

    /// Feedback submitted inside a half-open window
    pub async fn feedback_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<DecisionFeedback> {
        let entries = self.entries.read().await;
        entries
            .values()
            .filter(|f| f.submitted_at >= start && f.submitted_at < end)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{fixture, fixture_with_config, ruled_dispute};
    use resolve_dispute::DisputeConfig;
    use resolve_types::{ClaimType, OperatorId, PartyRole};

    fn ratings(fairness: u8, reasoning: u8, evidence_handling: u8) -> FeedbackRatings {
        FeedbackRatings {
            fairness,
            reasoning,
            evidence_handling,
        }
    }

    #[tokio::test]
    async fn test_feedback_after_close_records_winner() {
        let fx = fixture().await;
        let desk = FeedbackDesk::new(fx.lifecycle.clone());
        let dispute = ruled_dispute(&fx, ClaimType::NonPerformance).await;
        fx.lifecycle
            .accept_decision(&dispute.id, &fx.claimant.id)
            .await
            .unwrap();
        fx.lifecycle
            .accept_decision(&dispute.id, &fx.respondent.id)
            .await
            .unwrap();

        let feedback = desk
            .submit_feedback(
                &dispute.id,
                &fx.claimant.id,
                ratings(5, 4, 5),
                Some("clear and fast".to_string()),
            )
            .await
            .unwrap();
        assert!(feedback.was_winner);
        assert_eq!(feedback.party_role, PartyRole::Claimant);

        let loser = desk
            .submit_feedback(&dispute.id, &fx.respondent.id, ratings(2, 3, 2), None)
            .await
            .unwrap();
        assert!(!loser.was_winner);
    }

    #[tokio::test]
    async fn test_feedback_requires_closed_dispute() {
        let fx = fixture().await;
        let desk = FeedbackDesk::new(fx.lifecycle.clone());
        let dispute = ruled_dispute(&fx, ClaimType::NonPerformance).await;

        let err = desk
            .submit_feedback(&dispute.id, &fx.claimant.id, ratings(5, 5, 5), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidDisputeState { .. }));
    }

    #[tokio::test]
    async fn test_feedback_rejected_outside_window() {
        // A zero-day window closes the moment the dispute does
        let config = DisputeConfig {
            feedback_window_days: 0,
            ..DisputeConfig::default()
        };
        let fx = fixture_with_config(config).await;
        let desk = FeedbackDesk::new(fx.lifecycle.clone());
        let dispute = ruled_dispute(&fx, ClaimType::NonPerformance).await;
        fx.lifecycle
            .accept_decision(&dispute.id, &fx.claimant.id)
            .await
            .unwrap();
        fx.lifecycle
            .accept_decision(&dispute.id, &fx.respondent.id)
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let err = desk
            .submit_feedback(&dispute.id, &fx.claimant.id, ratings(5, 5, 5), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::FeedbackWindowClosed { .. }));
    }

    #[tokio::test]
    async fn test_non_party_feedback_rejected() {
        let fx = fixture().await;
        let desk = FeedbackDesk::new(fx.lifecycle.clone());
        let dispute = ruled_dispute(&fx, ClaimType::NonPerformance).await;
        fx.lifecycle
            .accept_decision(&dispute.id, &fx.claimant.id)
            .await
            .unwrap();
        fx.lifecycle
            .accept_decision(&dispute.id, &fx.respondent.id)
            .await
            .unwrap();
        let outsider = fx
            .ledger
            .register_agent(OperatorId::new(), "outsider")
            .await
            .unwrap();

        let err = desk
            .submit_feedback(&dispute.id, &outsider.id, ratings(1, 1, 1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotParty { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_feedback_rejected() {
        let fx = fixture().await;
        let desk = FeedbackDesk::new(fx.lifecycle.clone());
        let dispute = ruled_dispute(&fx, ClaimType::NonPerformance).await;
        fx.lifecycle
            .accept_decision(&dispute.id, &fx.claimant.id)
            .await
            .unwrap();
        fx.lifecycle
            .accept_decision(&dispute.id, &fx.respondent.id)
            .await
            .unwrap();

        desk.submit_feedback(&dispute.id, &fx.claimant.id, ratings(4, 4, 4), None)
            .await
            .unwrap();
        let err = desk
            .submit_feedback(&dispute.id, &fx.claimant.id, ratings(1, 1, 1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::FeedbackAlreadySubmitted { .. }));
    }

    #[tokio::test]
    async fn test_out_of_scale_rating_rejected() {
        let fx = fixture().await;
        let desk = FeedbackDesk::new(fx.lifecycle.clone());
        let dispute = ruled_dispute(&fx, ClaimType::NonPerformance).await;

        let err = desk
            .submit_feedback(&dispute.id, &fx.claimant.id, ratings(0, 4, 4), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidRating { .. }));
    }
}
