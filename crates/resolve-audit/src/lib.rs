//! Resolve Audit - Immutable audit log
//!
//! All consequential actions produce audit entries. The audit log is
//! append-only and each entry hashes its predecessor, so tampering anywhere
//! breaks the chain.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use resolve_types::{
    AgentId, AuditEntryId, DisputeId, EscalationId, EscrowId, Result, Ruling, TransactionId,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Types of auditable actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AuditAction {
    /// Agent registered
    AgentRegistered { agent_id: AgentId },
    /// Agent suspended or reinstated
    AgentStatusChanged { agent_id: AgentId, status: String },
    /// Dispute filed
    DisputeFiled {
        dispute_id: DisputeId,
        credits_charged: i64,
    },
    /// Respondent acknowledged a dispute
    DisputeAcknowledged { dispute_id: DisputeId },
    /// Evidence appended to a dispute
    EvidenceSubmitted { dispute_id: DisputeId },
    /// Ruling issued
    RulingIssued { dispute_id: DisputeId, ruling: Ruling },
    /// A party accepted or rejected the ruling
    RulingResponse {
        dispute_id: DisputeId,
        accepted: bool,
    },
    /// Dispute escalated to a human arbitrator
    DisputeEscalated {
        dispute_id: DisputeId,
        escalation_id: EscalationId,
    },
    /// Human ruling recorded
    EscalationResolved {
        escalation_id: EscalationId,
        ruling: Ruling,
    },
    /// Trust score adjusted
    TrustAdjusted {
        agent_id: AgentId,
        delta: i32,
        new_score: i32,
    },
    /// Escrow funded
    EscrowFunded {
        escrow_id: EscrowId,
        transaction_id: TransactionId,
    },
    /// Escrow settled
    EscrowSettled { escrow_id: EscrowId, outcome: String },
}

/// An audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry ID
    pub id: AuditEntryId,
    /// Previous entry hash (for chain)
    pub previous_hash: String,
    /// Entry hash
    pub hash: String,
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Actor, when a specific agent drove the action
    pub actor: Option<AgentId>,
    /// Action type
    pub action: AuditAction,
}

impl AuditEntry {
    /// Compute hash of this entry
    pub fn compute_hash(&self) -> String {
        use sha2::{Digest, Sha256};
        let content = format!(
            "{}:{}:{:?}:{:?}",
            self.previous_hash,
            self.timestamp.timestamp_millis(),
            self.actor,
            self.action
        );
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Verify the entry hash
    pub fn verify(&self) -> bool {
        self.hash == self.compute_hash()
    }
}

/// Audit log trait
#[async_trait::async_trait]
pub trait AuditLog: Send + Sync {
    /// Append an entry for an action
    async fn record(&self, actor: Option<AgentId>, action: AuditAction) -> Result<AuditEntryId>;

    /// Get entries touching a dispute, oldest first
    async fn entries_for_dispute(&self, dispute_id: &DisputeId) -> Result<Vec<AuditEntry>>;

    /// Verify the full chain
    async fn verify_chain(&self) -> Result<bool>;
}

/// Genesis hash for an empty chain
const GENESIS_HASH: &str = "0";

/// In-memory, append-only audit log
#[derive(Clone, Default)]
pub struct InMemoryAuditLog {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries recorded
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl AuditAction {
    fn dispute_id(&self) -> Option<&DisputeId> {
        match self {
            Self::DisputeFiled { dispute_id, .. }
            | Self::DisputeAcknowledged { dispute_id }
            | Self::EvidenceSubmitted { dispute_id }
            | Self::RulingIssued { dispute_id, .. }
            | Self::RulingResponse { dispute_id, .. }
            | Self::DisputeEscalated { dispute_id, .. } => Some(dispute_id),
            _ => None,
        }
    }
}

#[async_trait::async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn record(&self, actor: Option<AgentId>, action: AuditAction) -> Result<AuditEntryId> {
        let mut entries = self.entries.write().await;
        let previous_hash = entries
            .last()
            .map(|e| e.hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());

        let mut entry = AuditEntry {
            id: AuditEntryId::new(),
            previous_hash,
            hash: String::new(),
            timestamp: Utc::now(),
            actor,
            action,
        };
        entry.hash = entry.compute_hash();

        let id = entry.id.clone();
        entries.push(entry);
        Ok(id)
    }

    async fn entries_for_dispute(&self, dispute_id: &DisputeId) -> Result<Vec<AuditEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| e.action.dispute_id() == Some(dispute_id))
            .cloned()
            .collect())
    }

    async fn verify_chain(&self) -> Result<bool> {
        let entries = self.entries.read().await;
        let mut expected_previous = GENESIS_HASH.to_string();
        for entry in entries.iter() {
            if entry.previous_hash != expected_previous || !entry.verify() {
                return Ok(false);
            }
            expected_previous = entry.hash.clone();
        }
        Ok(true)
    }
}

impl std::fmt::Debug for InMemoryAuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryAuditLog").finish()
    }
}
