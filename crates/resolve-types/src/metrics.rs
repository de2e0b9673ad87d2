//! Decision engine metrics types for Resolve
//!
//! One immutable row per aggregation period. Rows feed the calibration
//! generator that adjusts future arbitration prompts.

use crate::{ClaimType, MetricsId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Confidence statistics over a set of decisions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceStats {
    /// Number of decisions in the sample
    pub count: u64,
    /// Mean confidence
    pub average: f64,
    /// Lowest confidence seen
    pub min: f64,
    /// Highest confidence seen
    pub max: f64,
}

impl ConfidenceStats {
    /// Compute stats from raw confidences; zero samples yield the default
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let count = samples.len() as u64;
        let sum: f64 = samples.iter().sum();
        let min = samples.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Self {
            count,
            average: sum / count as f64,
            min,
            max,
        }
    }
}

/// Per-claim-type slice of a metrics period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimTypeBreakdown {
    /// The claim type this row describes
    pub claim_type: ClaimType,
    /// Decisions of this type in the period
    pub decisions: u64,
    /// Share of those decisions that were escalated
    pub escalation_rate: f64,
    /// Share of those decisions accepted by both parties
    pub acceptance_rate: f64,
}

/// A rejection reason and how often it appeared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionReasonCount {
    /// The reason text as supplied by parties
    pub reason: String,
    /// Occurrences in the period
    pub count: u64,
}

/// Average feedback ratings over the period
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AverageRatings {
    /// Feedback entries in the sample
    pub count: u64,
    /// Mean fairness rating
    pub fairness: f64,
    /// Mean reasoning rating
    pub reasoning: f64,
    /// Mean evidence-handling rating
    pub evidence_handling: f64,
}

/// Write-once aggregate snapshot of decision quality over a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionEngineMetrics {
    /// Row ID
    pub id: MetricsId,
    /// Inclusive period start
    pub period_start: DateTime<Utc>,
    /// Exclusive period end
    pub period_end: DateTime<Utc>,
    /// Disputes ruled in the period
    pub total_decisions: u64,
    /// Share of decisions accepted by both parties
    pub both_accepted_rate: f64,
    /// Share of decisions escalated to a human
    pub escalation_rate: f64,
    /// Among resolved escalations, share where the human agreed with the AI
    pub human_agreement_rate: f64,
    /// Confidence stats where the human agreed
    pub confidence_when_agreed: ConfidenceStats,
    /// Confidence stats where the human disagreed
    pub confidence_when_disagreed: ConfidenceStats,
    /// Average party feedback ratings
    pub average_ratings: AverageRatings,
    /// Rejection reasons ranked by frequency, most common first
    pub top_rejection_reasons: Vec<RejectionReasonCount>,
    /// Per-claim-type breakdown
    pub by_claim_type: Vec<ClaimTypeBreakdown>,
    /// When the row was written
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_stats_from_samples() {
        let stats = ConfidenceStats::from_samples(&[0.6, 0.8, 1.0]);
        assert_eq!(stats.count, 3);
        assert!((stats.average - 0.8).abs() < f64::EPSILON);
        assert_eq!(stats.min, 0.6);
        assert_eq!(stats.max, 1.0);
    }

    #[test]
    fn test_confidence_stats_empty() {
        let stats = ConfidenceStats::from_samples(&[]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.average, 0.0);
    }
}
