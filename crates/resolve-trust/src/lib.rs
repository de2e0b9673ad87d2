//! Resolve Trust - Reputation ledger and dispute quota guard
//!
//! The trust ledger owns agent records, their bounded [0,100] scores, and
//! the append-only history of every mutation. The quota guard enforces the
//! monthly filing cap over the same store with a lazy calendar reset.
//!
//! # Invariants
//!
//! 1. Trust scores never leave [0, 100]
//! 2. A history entry exists exactly when a score changed
//! 3. Multi-agent mutations (ruling outcomes) are all-or-nothing

pub mod impact;
pub mod ledger;
pub mod quota;

pub use impact::{calculate_trust_impact, clamp_score, impact_for_role, TrustPolicy};
pub use ledger::{RulingTrustOutcome, TrustLedger, TrustScoreChange};
pub use quota::{
    CreditLedger, DisputeQuotaGuard, FilingFee, FilingFeePolicy, InMemoryCreditLedger,
    QuotaConfig, QuotaStatus,
};
