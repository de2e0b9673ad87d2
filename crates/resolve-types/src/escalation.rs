//! Escalation types for Resolve
//!
//! At most one escalation exists per dispute. When a human ruling arrives and
//! an AI ruling exists, an immutable accuracy comparison is recorded.

use crate::{AgentId, ComparisonId, DisputeId, EscalationId, Ruling};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of an escalation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EscalationStatus {
    /// Waiting for a human arbitrator
    Pending,
    /// Human ruling recorded
    Resolved,
}

/// A dispute routed to a human arbitrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Escalation {
    /// Escalation ID
    pub id: EscalationId,
    /// The escalated dispute
    pub dispute_id: DisputeId,
    /// The party that requested escalation, absent for the low-confidence
    /// auto-trigger
    pub requested_by: Option<AgentId>,
    /// Why the dispute was escalated
    pub reason: String,
    /// Current state
    pub status: EscalationStatus,
    /// The human arbitrator's ruling, once recorded
    pub arbitrator_ruling: Option<Ruling>,
    /// The human arbitrator's reasoning
    pub arbitrator_reasoning: Option<String>,
    /// When the escalation was requested
    pub requested_at: DateTime<Utc>,
    /// When the human ruling was recorded
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Immutable comparison between an AI ruling and the human ruling that
/// reviewed it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyComparison {
    /// Comparison ID
    pub id: ComparisonId,
    /// The dispute both rulings concern
    pub dispute_id: DisputeId,
    /// The escalation that produced the human ruling
    pub escalation_id: EscalationId,
    /// What the AI ruled
    pub ai_ruling: Ruling,
    /// What the human ruled
    pub human_ruling: Ruling,
    /// AI confidence at ruling time
    pub ai_confidence: f64,
    /// Factors the AI decision turned on
    pub ai_key_factors: Vec<String>,
    /// Whether the two rulings agree
    pub ruling_agreed: bool,
    /// When the comparison was recorded
    pub created_at: DateTime<Utc>,
}
