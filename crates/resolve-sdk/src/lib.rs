//! Resolve SDK - The exposed operation surface
//!
//! One facade over the whole system: trust ledger, quota guard, dispute
//! lifecycle, arbitration, escalation and feedback, metrics, and escrow.
//! Transport layers map their calls 1:1 onto `ResolveService` methods; every
//! method answers with the `Outcome` envelope.

pub mod envelope;
pub mod service;

pub use envelope::Outcome;
pub use service::{AgentTrust, ResolveService, ServiceOptions};

// The vocabulary callers need alongside the service
pub use resolve_arbitration::{DeterministicRulingProvider, HttpRulingProvider, RulingProvider};
pub use resolve_dispute::{DisputeConfig, EvidenceContent, FileDisputeRequest};
pub use resolve_trust::{FilingFeePolicy, QuotaConfig, TrustPolicy};
pub use resolve_types::{
    AgentId, AgentStatus, ClaimType, DisputeId, DisputeStatus, EvidenceKind, FeedbackRatings,
    OperatorId, PartyRole, Ruling, TransactionId,
};
