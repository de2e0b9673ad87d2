//! Agent types for Resolve
//!
//! One `ResolveAgent` exists per (operator, external reference) pair. Agents
//! are never hard-deleted; suspension is a status change so dispute history
//! stays attributable.

use crate::{AgentId, OperatorId, TrustEntryId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lower bound of the trust scale
pub const TRUST_SCORE_MIN: i32 = 0;
/// Upper bound of the trust scale
pub const TRUST_SCORE_MAX: i32 = 100;
/// Score assigned at registration
pub const TRUST_SCORE_INITIAL: i32 = 50;

/// Operational status of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentStatus {
    /// Agent may transact and file disputes
    Active,
    /// Agent is barred from new activity; existing disputes continue
    Suspended,
}

/// A registered agent participating in transactions and disputes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveAgent {
    /// Unique agent ID
    pub id: AgentId,
    /// Operator account that owns this agent
    pub operator_id: OperatorId,
    /// Caller-chosen identifier, unique per operator
    pub external_ref: String,
    /// Bounded reputation score, always within [0, 100]
    pub trust_score: i32,
    /// Transactions this agent has participated in
    pub transactions_total: u64,
    /// Transactions completed without dispute
    pub transactions_completed: u64,
    /// Disputes filed by this agent
    pub disputes_as_claimant: u64,
    /// Disputes filed against this agent
    pub disputes_as_respondent: u64,
    /// Disputes this agent won
    pub disputes_won: u64,
    /// Disputes this agent lost
    pub disputes_lost: u64,
    /// Disputes filed in the current calendar month
    pub disputes_this_month: u32,
    /// When the monthly counter was last reset
    pub monthly_reset_at: DateTime<Utc>,
    /// Operational status
    pub status: AgentStatus,
    /// When the agent was registered
    pub created_at: DateTime<Utc>,
}

impl ResolveAgent {
    /// Create a freshly registered agent
    pub fn register(operator_id: OperatorId, external_ref: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: AgentId::new(),
            operator_id,
            external_ref: external_ref.into(),
            trust_score: TRUST_SCORE_INITIAL,
            transactions_total: 0,
            transactions_completed: 0,
            disputes_as_claimant: 0,
            disputes_as_respondent: 0,
            disputes_won: 0,
            disputes_lost: 0,
            disputes_this_month: 0,
            monthly_reset_at: now,
            status: AgentStatus::Active,
            created_at: now,
        }
    }

    /// Check whether the agent may initiate new activity
    pub fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }
}

/// Back-reference from a trust mutation to the event that caused it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustReference {
    /// Kind of originating record, e.g. "dispute" or "transaction"
    pub reference_type: String,
    /// Identifier of the originating record
    pub reference_id: String,
}

impl TrustReference {
    pub fn new(reference_type: impl Into<String>, reference_id: impl Into<String>) -> Self {
        Self {
            reference_type: reference_type.into(),
            reference_id: reference_id.into(),
        }
    }
}

/// Immutable record of a single trust-score mutation
///
/// Created exactly once per mutation, inside the same transaction as the
/// score write. History reads are ordered by creation time descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustHistoryEntry {
    /// Entry ID
    pub id: TrustEntryId,
    /// Agent whose score changed
    pub agent_id: AgentId,
    /// Score before the mutation
    pub previous_score: i32,
    /// Score after the mutation (clamped)
    pub new_score: i32,
    /// Signed delta as requested (pre-clamp)
    pub delta: i32,
    /// Free-text reason for the change
    pub reason: String,
    /// Optional back-reference to the originating record
    pub reference: Option<TrustReference>,
    /// When the mutation happened
    pub created_at: DateTime<Utc>,
}
