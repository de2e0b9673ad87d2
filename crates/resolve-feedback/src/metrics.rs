//! Decision engine metrics
//!
//! `aggregate_metrics` is a batch job, never request-path code. It scans the
//! disputes ruled inside a period and writes one immutable row; a window
//! with zero decisions writes nothing.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;

use resolve_dispute::DisputeLifecycle;
use resolve_types::{
    AverageRatings, ClaimType, ClaimTypeBreakdown, CloseReason, ConfidenceStats,
    DecisionEngineMetrics, MetricsId, RejectionReasonCount, ResolveError, Result,
};

use crate::escalation::EscalationDesk;
use crate::feedback::FeedbackDesk;

/// How many rejection reasons a row retains
const TOP_REASONS: usize = 5;

/// Store of immutable metrics rows
#[derive(Clone, Default)]
pub struct MetricsStore {
    rows: Arc<RwLock<Vec<DecisionEngineMetrics>>>,
}

impl MetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent row, by period end
    pub async fn latest(&self) -> Option<DecisionEngineMetrics> {
        let rows = self.rows.read().await;
        rows.iter().max_by_key(|r| r.period_end).cloned()
    }

    /// All rows, unordered
    pub async fn all(&self) -> Vec<DecisionEngineMetrics> {
        self.rows.read().await.clone()
    }

    pub(crate) async fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        let rows = self.rows.read().await;
        rows.iter()
            .any(|r| r.period_start < end && start < r.period_end)
    }

    pub(crate) async fn insert(&self, row: DecisionEngineMetrics) {
        self.rows.write().await.push(row);
    }
}

/// Aggregates decision-quality metrics per period
#[derive(Clone)]
pub struct MetricsAggregator {
    lifecycle: DisputeLifecycle,
    escalations: EscalationDesk,
    feedback: FeedbackDesk,
    store: MetricsStore,
}

impl MetricsAggregator {
    pub fn new(
        lifecycle: DisputeLifecycle,
        escalations: EscalationDesk,
        feedback: FeedbackDesk,
        store: MetricsStore,
    ) -> Self {
        Self {
            lifecycle,
            escalations,
            feedback,
            store,
        }
    }

    /// Aggregate one non-overlapping period
    ///
    /// Returns the written row, or `None` when the window held no decisions
    /// (in which case nothing is written).
    pub async fn aggregate_metrics(
        &self,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<Option<DecisionEngineMetrics>> {
        if period_end <= period_start {
            return Err(ResolveError::invalid_input(
                "period_end",
                "must be after period_start",
            ));
        }
        if self.store.overlaps(period_start, period_end).await {
            return Err(ResolveError::invalid_input(
                "period_start",
                "overlaps an already-aggregated metrics period",
            ));
        }

        let disputes = self
            .lifecycle
            .disputes_ruled_between(period_start, period_end)
            .await;
        if disputes.is_empty() {
            info!(%period_start, %period_end, "no decisions in window, skipping metrics row");
            return Ok(None);
        }

        let total = disputes.len() as u64;
        let both_accepted = disputes
            .iter()
            .filter(|d| d.close_reason == Some(CloseReason::BothAccepted))
            .count() as u64;

        let mut escalated = 0u64;
        let mut agreed_confidences = Vec::new();
        let mut disagreed_confidences = Vec::new();
        let mut agreements = 0u64;
        let mut comparisons = 0u64;
        for dispute in &disputes {
            if self.escalations.is_escalated(&dispute.id).await {
                escalated += 1;
            }
            if let Some(comparison) = self.escalations.comparison_for(&dispute.id).await {
                comparisons += 1;
                if comparison.ruling_agreed {
                    agreements += 1;
                    agreed_confidences.push(comparison.ai_confidence);
                } else {
                    disagreed_confidences.push(comparison.ai_confidence);
                }
            }
        }

        let dispute_ids: Vec<_> = disputes.iter().map(|d| d.id.clone()).collect();
        let feedback = self.feedback.feedback_for_disputes(&dispute_ids).await;
        let average_ratings = if feedback.is_empty() {
            AverageRatings::default()
        } else {
            let count = feedback.len() as u64;
            let n = feedback.len() as f64;
            AverageRatings {
                count,
                fairness: feedback.iter().map(|f| f.ratings.fairness as f64).sum::<f64>() / n,
                reasoning: feedback.iter().map(|f| f.ratings.reasoning as f64).sum::<f64>() / n,
                evidence_handling: feedback
                    .iter()
                    .map(|f| f.ratings.evidence_handling as f64)
                    .sum::<f64>()
                    / n,
            }
        };

        let mut reason_counts: HashMap<String, u64> = HashMap::new();
        for dispute in &disputes {
            for decision in [&dispute.claimant_decision, &dispute.respondent_decision] {
                if let Some(reason) = &decision.rejection_reason {
                    *reason_counts.entry(reason.clone()).or_insert(0) += 1;
                }
            }
        }
        let mut top_rejection_reasons: Vec<RejectionReasonCount> = reason_counts
            .into_iter()
            .map(|(reason, count)| RejectionReasonCount { reason, count })
            .collect();
        top_rejection_reasons.sort_by(|a, b| b.count.cmp(&a.count).then(a.reason.cmp(&b.reason)));
        top_rejection_reasons.truncate(TOP_REASONS);

        let mut by_type: HashMap<ClaimType, (u64, u64, u64)> = HashMap::new();
        for dispute in &disputes {
            let slot = by_type.entry(dispute.claim_type).or_insert((0, 0, 0));
            slot.0 += 1;
            if self.escalations.is_escalated(&dispute.id).await {
                slot.1 += 1;
            }
            if dispute.close_reason == Some(CloseReason::BothAccepted) {
                slot.2 += 1;
            }
        }
        let mut by_claim_type: Vec<ClaimTypeBreakdown> = by_type
            .into_iter()
            .map(|(claim_type, (decisions, escalated, accepted))| ClaimTypeBreakdown {
                claim_type,
                decisions,
                escalation_rate: escalated as f64 / decisions as f64,
                acceptance_rate: accepted as f64 / decisions as f64,
            })
            .collect();
        by_claim_type.sort_by(|a, b| b.decisions.cmp(&a.decisions));

        let row = DecisionEngineMetrics {
            id: MetricsId::new(),
            period_start,
            period_end,
            total_decisions: total,
            both_accepted_rate: both_accepted as f64 / total as f64,
            escalation_rate: escalated as f64 / total as f64,
            human_agreement_rate: if comparisons == 0 {
                0.0
            } else {
                agreements as f64 / comparisons as f64
            },
            confidence_when_agreed: ConfidenceStats::from_samples(&agreed_confidences),
            confidence_when_disagreed: ConfidenceStats::from_samples(&disagreed_confidences),
            average_ratings,
            top_rejection_reasons,
            by_claim_type,
            created_at: Utc::now(),
        };

        info!(
            decisions = row.total_decisions,
            escalation_rate = row.escalation_rate,
            "metrics row written"
        );
        self.store.insert(row.clone()).await;
        Ok(Some(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::EscalationDesk;
    use crate::feedback::FeedbackDesk;
    use crate::testutil::{fixture, ruled_dispute};
    use chrono::Duration;
    use resolve_arbitration::CalibrationSource;
    use resolve_audit::InMemoryAuditLog;
    use resolve_types::{ClaimType, FeedbackRatings, Ruling};

    struct Desks {
        escalations: EscalationDesk,
        feedback: FeedbackDesk,
        store: MetricsStore,
        aggregator: MetricsAggregator,
    }

    fn desks(fx: &crate::testutil::Fixture) -> Desks {
        let escalations =
            EscalationDesk::new(fx.lifecycle.clone(), Arc::new(InMemoryAuditLog::new()));
        let feedback = FeedbackDesk::new(fx.lifecycle.clone());
        let store = MetricsStore::new();
        let aggregator = MetricsAggregator::new(
            fx.lifecycle.clone(),
            escalations.clone(),
            feedback.clone(),
            store.clone(),
        );
        Desks {
            escalations,
            feedback,
            store,
            aggregator,
        }
    }

    #[tokio::test]
    async fn test_empty_window_writes_nothing() {
        let fx = fixture().await;
        let d = desks(&fx);
        let now = Utc::now();

        let row = d
            .aggregator
            .aggregate_metrics(now - Duration::days(7), now)
            .await
            .unwrap();
        assert!(row.is_none());
        assert!(d.store.latest().await.is_none());
    }

    #[tokio::test]
    async fn test_aggregation_covers_rates_and_reasons() {
        let fx = fixture().await;
        let d = desks(&fx);

        // Dispute 1: accepted by both, feedback from the winner
        let accepted = ruled_dispute(&fx, ClaimType::NonPerformance).await;
        fx.lifecycle
            .accept_decision(&accepted.id, &fx.claimant.id)
            .await
            .unwrap();
        fx.lifecycle
            .accept_decision(&accepted.id, &fx.respondent.id)
            .await
            .unwrap();
        d.feedback
            .submit_feedback(
                &accepted.id,
                &fx.claimant.id,
                FeedbackRatings {
                    fairness: 5,
                    reasoning: 4,
                    evidence_handling: 5,
                },
                None,
            )
            .await
            .unwrap();

        // Dispute 2: rejected, escalated, human disagrees with the AI
        let contested = ruled_dispute(&fx, ClaimType::QualityIssue).await;
        fx.lifecycle
            .reject_decision(
                &contested.id,
                &fx.respondent.id,
                Some("evidence was ignored".to_string()),
            )
            .await
            .unwrap();
        d.escalations
            .request_escalation(&contested.id, Some(&fx.respondent.id), "wrong call")
            .await
            .unwrap();
        d.escalations
            .resolve_escalation(&contested.id, Ruling::Respondent, "logs are conclusive")
            .await
            .unwrap();

        let now = Utc::now();
        let row = d
            .aggregator
            .aggregate_metrics(now - Duration::hours(1), now + Duration::seconds(1))
            .await
            .unwrap()
            .expect("row written");

        assert_eq!(row.total_decisions, 2);
        assert!((row.both_accepted_rate - 0.5).abs() < f64::EPSILON);
        assert!((row.escalation_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(row.human_agreement_rate, 0.0);
        assert_eq!(row.confidence_when_disagreed.count, 1);
        assert_eq!(row.confidence_when_agreed.count, 0);
        assert_eq!(row.average_ratings.count, 1);
        assert_eq!(row.top_rejection_reasons.len(), 1);
        assert_eq!(row.top_rejection_reasons[0].reason, "evidence was ignored");
        assert_eq!(row.by_claim_type.len(), 2);

        // The store now feeds calibration
        let context = d.store.calibration_context().await;
        assert!(context.contains("evidence was ignored"));
    }

    #[tokio::test]
    async fn test_overlapping_period_rejected() {
        let fx = fixture().await;
        let d = desks(&fx);
        ruled_dispute(&fx, ClaimType::NonPerformance).await;

        let now = Utc::now();
        d.aggregator
            .aggregate_metrics(now - Duration::hours(1), now + Duration::seconds(1))
            .await
            .unwrap()
            .expect("row written");

        let err = d
            .aggregator
            .aggregate_metrics(now - Duration::minutes(30), now + Duration::hours(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_inverted_period_rejected() {
        let fx = fixture().await;
        let d = desks(&fx);
        let now = Utc::now();
        let err = d
            .aggregator
            .aggregate_metrics(now, now - Duration::hours(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidInput { .. }));
    }
}
