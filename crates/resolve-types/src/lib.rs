//! Resolve Types - Canonical domain types
//!
//! Foundation crate for the Resolve workspace. Holds the strongly-typed IDs,
//! domain entities, and the central error type. Depends on nothing else in
//! the workspace so every component crate can share a vocabulary.

pub mod agent;
pub mod dispute;
pub mod error;
pub mod escalation;
pub mod escrow;
pub mod evidence;
pub mod feedback;
pub mod identity;
pub mod metrics;

pub use agent::{
    AgentStatus, ResolveAgent, TrustHistoryEntry, TrustReference, TRUST_SCORE_INITIAL,
    TRUST_SCORE_MAX, TRUST_SCORE_MIN,
};
pub use dispute::{
    ClaimType, CloseReason, DisputeStatus, PartyDecision, PartyRole, ResolveDispute, Ruling,
    RulingDetails,
};
pub use error::{ResolveError, Result};
pub use escalation::{AccuracyComparison, Escalation, EscalationStatus};
pub use escrow::{EscrowAccount, EscrowState, SettlementTransfer};
pub use evidence::{Evidence, EvidenceKind, ExtractedText};
pub use feedback::{DecisionFeedback, FeedbackRatings};
pub use identity::{
    AgentId, AuditEntryId, ComparisonId, DisputeId, EscalationId, EscrowId, EvidenceId,
    FeedbackId, MetricsId, OperatorId, TransactionId, TransferId, TrustEntryId,
};
pub use metrics::{
    AverageRatings, ClaimTypeBreakdown, ConfidenceStats, DecisionEngineMetrics,
    RejectionReasonCount,
};
