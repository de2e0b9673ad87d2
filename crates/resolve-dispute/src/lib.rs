//! Resolve Dispute - Lifecycle state machine and evidence workflow
//!
//! Drives disputes from filing to closure:
//! `FILED -> EVIDENCE_SUBMISSION -> RULED -> {ACCEPTED | REJECTED |
//! ESCALATED} -> CLOSED`, with `DISMISSED` and lazily-evaluated `EXPIRED` as
//! secondary terminals.
//!
//! # Invariants
//!
//! 1. Illegal transitions fail with the current state surfaced and mutate
//!    nothing
//! 2. The ruling, both trust impacts, and the win/loss counters persist in
//!    one transaction
//! 3. The AI ruling call never holds a store lock
//! 4. Deadlines are evaluated lazily at the next touch; no scheduler exists

pub mod config;
pub mod evidence;
pub mod lifecycle;

pub use config::DisputeConfig;
pub use evidence::{EvidenceStore, PlainTextExtractor, TextExtractor};
pub use lifecycle::{DisputeLifecycle, DisputeServices, EvidenceContent, FileDisputeRequest};
