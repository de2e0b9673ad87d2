//! Dispute lifecycle configuration
//!
//! Every SLA window is configuration. Deadlines are evaluated lazily at the
//! next touch of a dispute, never by a scheduler.

use serde::{Deserialize, Serialize};

/// SLA windows and lifecycle policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisputeConfig {
    /// Hours the respondent has to acknowledge a filing
    pub response_deadline_hours: i64,
    /// Hours of evidence review once the respondent acknowledges
    pub evidence_window_hours: i64,
    /// Hours after a ruling before it lazily becomes binding despite a
    /// rejection with no escalation
    pub ruling_finality_window_hours: i64,
    /// Days after closure during which feedback is accepted
    pub feedback_window_days: i64,
    /// Rulings under this confidence are auto-escalated to a human
    pub auto_escalate_below_confidence: f64,
    /// Cap on direct-text evidence content, in characters
    pub max_evidence_chars: usize,
    /// Minimum claim summary length accepted at filing
    pub min_summary_chars: usize,
}

impl Default for DisputeConfig {
    fn default() -> Self {
        Self {
            response_deadline_hours: 72,
            evidence_window_hours: 24,
            ruling_finality_window_hours: 168,
            feedback_window_days: 30,
            auto_escalate_below_confidence: 0.55,
            max_evidence_chars: 50_000,
            min_summary_chars: 10,
        }
    }
}
