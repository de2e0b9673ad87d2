//! Evidence store and text extraction seam
//!
//! Evidence lives on per-dispute shelves so submissions against different
//! disputes never contend. Shelves are append-only; entries are returned in
//! submission order.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use resolve_types::{DisputeId, Evidence, ExtractedText, ResolveError, Result};

/// External file-to-text extraction collaborator
///
/// Document parsing lives outside this system. A failure (scanned or
/// image-only files) tells the caller to resubmit as text; it never aborts
/// the dispute.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, data: &[u8], filename: &str) -> Result<ExtractedText>;
}

/// Extractor that accepts UTF-8 payloads only
///
/// Stands in for the real document pipeline in tests and demos.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract_text(&self, data: &[u8], filename: &str) -> Result<ExtractedText> {
        if data.is_empty() {
            return Err(ResolveError::ExtractionFailed {
                filename: filename.to_string(),
                reason: "file is empty".to_string(),
            });
        }
        let text = std::str::from_utf8(data).map_err(|_| ResolveError::ExtractionFailed {
            filename: filename.to_string(),
            reason: "no extractable text (binary or image-only document)".to_string(),
        })?;
        Ok(ExtractedText {
            text: text.to_string(),
            page_count: 1,
            truncated: false,
        })
    }
}

/// Append-only evidence shelves keyed by dispute
#[derive(Clone, Default)]
pub struct EvidenceStore {
    shelves: Arc<DashMap<DisputeId, Vec<Evidence>>>,
}

impl EvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to its dispute's shelf
    pub fn append(&self, evidence: Evidence) {
        self.shelves
            .entry(evidence.dispute_id.clone())
            .or_default()
            .push(evidence);
    }

    /// All evidence for a dispute, submission order
    pub fn for_dispute(&self, dispute_id: &DisputeId) -> Vec<Evidence> {
        self.shelves
            .get(dispute_id)
            .map(|shelf| shelf.clone())
            .unwrap_or_default()
    }

    /// Number of entries on a dispute's shelf
    pub fn count(&self, dispute_id: &DisputeId) -> usize {
        self.shelves.get(dispute_id).map(|s| s.len()).unwrap_or(0)
    }
}
