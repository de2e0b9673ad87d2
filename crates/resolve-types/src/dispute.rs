//! Dispute types for Resolve
//!
//! A dispute is owned collectively by its two parties. No third party may
//! mutate it except the arbitration and escalation subsystems.

use crate::{AgentId, DisputeId, ResolveError, Result, TransactionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Nature of the claim being filed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimType {
    /// Counterparty did not perform at all
    NonPerformance,
    /// Counterparty performed only part of the agreed work
    PartialPerformance,
    /// Work was delivered but below the agreed standard
    QualityIssue,
    /// Disagreement over amounts paid or owed
    PaymentDispute,
    /// Counterparty misrepresented the service or goods
    Misrepresentation,
    /// Counterparty violated agreed terms
    BreachOfTerms,
    /// Anything else
    Other,
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NonPerformance => "NON_PERFORMANCE",
            Self::PartialPerformance => "PARTIAL_PERFORMANCE",
            Self::QualityIssue => "QUALITY_ISSUE",
            Self::PaymentDispute => "PAYMENT_DISPUTE",
            Self::Misrepresentation => "MISREPRESENTATION",
            Self::BreachOfTerms => "BREACH_OF_TERMS",
            Self::Other => "OTHER",
        };
        write!(f, "{}", s)
    }
}

/// Which side of a dispute an agent is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartyRole {
    /// The filing party
    Claimant,
    /// The party the claim is against
    Respondent,
}

impl PartyRole {
    /// The other side
    pub fn opposing(&self) -> Self {
        match self {
            Self::Claimant => Self::Respondent,
            Self::Respondent => Self::Claimant,
        }
    }
}

impl fmt::Display for PartyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Claimant => write!(f, "CLAIMANT"),
            Self::Respondent => write!(f, "RESPONDENT"),
        }
    }
}

/// Outcome of arbitration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Ruling {
    /// Claim upheld in favor of the claimant
    Claimant,
    /// Claim denied in favor of the respondent
    Respondent,
    /// Fault on both sides
    Split,
    /// Claim was frivolous or unsupportable
    Dismissed,
}

impl Ruling {
    /// The role this ruling favors, if any
    pub fn winning_role(&self) -> Option<PartyRole> {
        match self {
            Self::Claimant => Some(PartyRole::Claimant),
            Self::Respondent => Some(PartyRole::Respondent),
            Self::Split | Self::Dismissed => None,
        }
    }

    /// Whether the given role won under this ruling
    pub fn is_winner(&self, role: PartyRole) -> bool {
        self.winning_role() == Some(role)
    }
}

impl fmt::Display for Ruling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Claimant => write!(f, "CLAIMANT"),
            Self::Respondent => write!(f, "RESPONDENT"),
            Self::Split => write!(f, "SPLIT"),
            Self::Dismissed => write!(f, "DISMISSED"),
        }
    }
}

/// Structured detail attached to a ruling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulingDetails {
    /// Model confidence in [0.0, 1.0]
    pub confidence: f64,
    /// Factors the decision turned on
    pub key_factors: Vec<String>,
}

/// Dispute lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisputeStatus {
    /// Filed, awaiting respondent acknowledgement
    Filed,
    /// Both parties may submit evidence
    EvidenceSubmission,
    /// Ruling issued, awaiting party responses
    Ruled,
    /// One party accepted, awaiting the other
    Accepted,
    /// A party rejected the ruling; awaiting escalation or finality
    Rejected,
    /// Routed to a human arbitrator
    Escalated,
    /// Claim dismissed at ruling time
    Dismissed,
    /// Response deadline elapsed with no respondent action
    Expired,
    /// Terminal; ruling is binding and the feedback window is open
    Closed,
}

impl DisputeStatus {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Dismissed | Self::Expired)
    }

    /// States in which a ruling exists and parties may respond to it
    pub fn awaiting_ruling_response(&self) -> bool {
        matches!(self, Self::Ruled | Self::Accepted | Self::Rejected)
    }
}

impl fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Filed => "FILED",
            Self::EvidenceSubmission => "EVIDENCE_SUBMISSION",
            Self::Ruled => "RULED",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::Escalated => "ESCALATED",
            Self::Dismissed => "DISMISSED",
            Self::Expired => "EXPIRED",
            Self::Closed => "CLOSED",
        };
        write!(f, "{}", s)
    }
}

/// How a dispute reached its terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CloseReason {
    /// Both parties accepted the ruling
    BothAccepted,
    /// A human arbitrator resolved the escalation
    EscalationResolved,
    /// The finality window elapsed after a rejection with no escalation
    FinalityElapsed,
}

/// One side's recorded response to a ruling
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartyDecision {
    /// True = accepted, false = rejected, unset = no response yet
    pub accepted: Option<bool>,
    /// Reason supplied with a rejection
    pub rejection_reason: Option<String>,
    /// When the response was recorded
    pub responded_at: Option<DateTime<Utc>>,
}

impl PartyDecision {
    /// Whether this party has already responded
    pub fn recorded(&self) -> bool {
        self.accepted.is_some()
    }
}

/// A dispute over a completed transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveDispute {
    /// Unique dispute ID
    pub id: DisputeId,
    /// The transaction under dispute
    pub transaction_id: TransactionId,
    /// The filing agent
    pub claimant_id: AgentId,
    /// The agent the claim is against
    pub respondent_id: AgentId,
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
    /// Lifecycle state
    pub status: DisputeStatus,
    /// Deadline for the respondent to acknowledge
    pub response_deadline: DateTime<Utc>,
    /// End of the evidence review window, set when the respondent acknowledges
    pub evidence_deadline: Option<DateTime<Utc>>,
    /// Whether the claimant marked evidence submission complete
    pub claimant_evidence_complete: bool,
    /// Whether the respondent marked evidence submission complete
    pub respondent_evidence_complete: bool,
    /// Credits charged at filing
    pub credits_charged: i64,
    /// Whether filing was free under the waiver policy
    pub was_free: bool,
    /// Ruling, once issued
    pub ruling: Option<Ruling>,
    /// Narrative reasoning behind the ruling
    pub ruling_reasoning: Option<String>,
    /// Structured ruling detail
    pub ruling_details: Option<RulingDetails>,
    /// When the ruling was issued
    pub ruled_at: Option<DateTime<Utc>>,
    /// Claimant's response to the ruling
    pub claimant_decision: PartyDecision,
    /// Respondent's response to the ruling
    pub respondent_decision: PartyDecision,
    /// How the dispute closed
    pub close_reason: Option<CloseReason>,
    /// When the dispute closed
    pub closed_at: Option<DateTime<Utc>>,
    /// When the dispute was filed
    pub filed_at: DateTime<Utc>,
}

impl ResolveDispute {
    /// Determine which side an agent is on
    ///
    /// Malformed data where an agent appears on both sides is a
    /// data-integrity error, never a valid state.
    pub fn role_of(&self, agent_id: &AgentId) -> Result<PartyRole> {
        let is_claimant = &self.claimant_id == agent_id;
        let is_respondent = &self.respondent_id == agent_id;
        match (is_claimant, is_respondent) {
            (true, true) => Err(ResolveError::DataIntegrity {
                message: format!(
                    "agent {} is both claimant and respondent on dispute {}",
                    agent_id, self.id
                ),
            }),
            (true, false) => Ok(PartyRole::Claimant),
            (false, true) => Ok(PartyRole::Respondent),
            (false, false) => Err(ResolveError::NotParty {
                agent_id: agent_id.to_string(),
                dispute_id: self.id.to_string(),
            }),
        }
    }

    /// The agent on the given side
    pub fn party(&self, role: PartyRole) -> &AgentId {
        match role {
            PartyRole::Claimant => &self.claimant_id,
            PartyRole::Respondent => &self.respondent_id,
        }
    }

    /// Mutable view of one side's ruling response
    pub fn decision_mut(&mut self, role: PartyRole) -> &mut PartyDecision {
        match role {
            PartyRole::Claimant => &mut self.claimant_decision,
            PartyRole::Respondent => &mut self.respondent_decision,
        }
    }

    /// One side's ruling response
    pub fn decision(&self, role: PartyRole) -> &PartyDecision {
        match role {
            PartyRole::Claimant => &self.claimant_decision,
            PartyRole::Respondent => &self.respondent_decision,
        }
    }

    /// Whether both parties accepted the ruling
    pub fn both_accepted(&self) -> bool {
        self.claimant_decision.accepted == Some(true)
            && self.respondent_decision.accepted == Some(true)
    }

    /// Whether both parties have marked evidence submission complete
    pub fn evidence_marked_complete(&self) -> bool {
        self.claimant_evidence_complete && self.respondent_evidence_complete
    }

    /// Whether the response deadline has elapsed while still FILED
    pub fn response_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == DisputeStatus::Filed && now > self.response_deadline
    }

    /// Whether the evidence review window has elapsed
    pub fn evidence_window_elapsed(&self, now: DateTime<Utc>) -> bool {
        self.evidence_deadline.map(|d| now > d).unwrap_or(false)
    }

    /// Whether arbitration may run: both parties done, or the window elapsed
    pub fn ready_for_ruling(&self, now: DateTime<Utc>) -> bool {
        self.status == DisputeStatus::EvidenceSubmission
            && (self.evidence_marked_complete() || self.evidence_window_elapsed(now))
    }
}
