//! Resolve Feedback - Escalation desk, decision feedback, and calibration
//!
//! The feedback loop around the arbitration engine:
//!
//! - Escalations route disputed AI rulings to human arbitrators and record
//!   agreement or disagreement
//! - Parties rate closed decisions inside a 30-day window
//! - A periodic batch job aggregates decision-quality metrics
//! - The latest metrics row yields calibration text injected into future
//!   arbitration prompts

pub mod calibration;
pub mod escalation;
pub mod feedback;
pub mod metrics;

pub use calibration::calibration_lines;
pub use escalation::EscalationDesk;
pub use feedback::FeedbackDesk;
pub use metrics::{MetricsAggregator, MetricsStore};
