//! Decision feedback types for Resolve
//!
//! One feedback entry may exist per (dispute, agent) pair, submitted within
//! the 30-day window after closure.

use crate::{AgentId, DisputeId, FeedbackId, PartyRole, ResolveError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The three 1-5 ratings a party gives a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRatings {
    /// Perceived fairness of the outcome
    pub fairness: u8,
    /// Quality of the reasoning
    pub reasoning: u8,
    /// How well the evidence was weighed
    pub evidence_handling: u8,
}

impl FeedbackRatings {
    /// Validate that every rating sits on the 1-5 scale
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("fairness", self.fairness),
            ("reasoning", self.reasoning),
            ("evidence_handling", self.evidence_handling),
        ] {
            if !(1..=5).contains(&value) {
                return Err(ResolveError::InvalidRating {
                    field: field.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// One party's feedback on a resolved dispute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionFeedback {
    /// Feedback ID
    pub id: FeedbackId,
    /// The dispute the feedback concerns
    pub dispute_id: DisputeId,
    /// The submitting agent
    pub agent_id: AgentId,
    /// Which side the submitter was on
    pub party_role: PartyRole,
    /// Whether that side won, derived from the binding ruling
    pub was_winner: bool,
    /// The three ratings
    pub ratings: FeedbackRatings,
    /// Optional free-text comment
    pub comment: Option<String>,
    /// When the feedback was submitted
    pub submitted_at: DateTime<Utc>,
}
