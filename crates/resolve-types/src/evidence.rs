//! Evidence types for Resolve
//!
//! Evidence is append-only. Entries are never edited after creation and are
//! ordered by submission time ascending when assembled for arbitration.

use crate::{AgentId, DisputeId, EvidenceId, PartyRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of evidence being submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceKind {
    /// Message logs between the parties
    Correspondence,
    /// Contract, statement of work, or agreed terms
    Agreement,
    /// Proof of delivery or completion
    DeliveryProof,
    /// Payment records
    PaymentRecord,
    /// Program output, logs, or artifacts
    WorkProduct,
    /// Screenshots or other captures
    Screenshot,
    /// Anything else
    Other,
}

/// A single evidence entry on a dispute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Entry ID
    pub id: EvidenceId,
    /// The dispute this belongs to
    pub dispute_id: DisputeId,
    /// The submitting agent
    pub submitted_by: AgentId,
    /// Which side the submitter is on, inferred at submission time
    pub submitted_as: PartyRole,
    /// Kind of evidence
    pub kind: EvidenceKind,
    /// Caller-supplied title
    pub title: String,
    /// Normalized text content (raw text, or extracted from a file)
    pub content: String,
    /// Source filename when the content came from a file
    pub source_filename: Option<String>,
    /// Page count reported by extraction
    pub page_count: Option<u32>,
    /// Whether extraction truncated the content
    pub truncated: bool,
    /// When the entry was submitted
    pub submitted_at: DateTime<Utc>,
}

/// Result of running a file through the text-extraction collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedText {
    /// The extracted text
    pub text: String,
    /// Pages seen in the source document
    pub page_count: u32,
    /// Whether the extractor truncated the output
    pub truncated: bool,
}
