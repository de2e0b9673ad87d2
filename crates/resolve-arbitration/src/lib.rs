//! Resolve Arbitration - AI ruling engine
//!
//! A single interface over the black-box ruling capability:
//!
//! - HTTP provider for any OpenAI-compatible endpoint (no key required for
//!   local backends)
//! - Deterministic fallback when no model is available
//!
//! ## Key Design Principles
//!
//! 1. The capability **decides**, this crate never invents a ruling on failure
//! 2. Every provider answer is validated before use
//! 3. The engine is stateless; dispute and evidence entities carry all state
//! 4. Calibration notes from historical metrics flow in through a trait seam

pub mod engine;
pub mod prompt;
pub mod providers;
pub mod types;

pub use engine::{ArbitrationEngine, CalibrationSource, NoCalibration};
pub use providers::{
    DeterministicRulingProvider, HttpRulingConfig, HttpRulingProvider, RulingProvider,
};
pub use types::{
    parse_ruling_json, ArbitrationContext, EvidenceItem, RulingError, RulingOutcome, RulingResult,
};
