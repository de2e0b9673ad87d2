//! Escrow types for Resolve
//!
//! An escrow optionally holds funds for a transaction while a dispute over it
//! is live. Release happens exactly once, to a destination authorized by the
//! final ruling.

use crate::{AgentId, EscrowId, TransactionId, TransferId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of an escrow account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EscrowState {
    /// Funds are held
    Funded,
    /// Funds went to the payee
    Released,
    /// Funds went back to the payer
    Refunded,
    /// Funds were divided between the parties
    Split,
}

impl EscrowState {
    /// Check if funds have already moved out
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Released | Self::Refunded | Self::Split)
    }
}

/// An escrow account keyed by transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscrowAccount {
    /// Escrow ID
    pub id: EscrowId,
    /// The transaction the funds belong to
    pub transaction_id: TransactionId,
    /// The paying agent (refund destination)
    pub payer_id: AgentId,
    /// The receiving agent (release destination)
    pub payee_id: AgentId,
    /// Amount held, smallest currency unit
    pub amount_cents: i64,
    /// Current state
    pub state: EscrowState,
    /// Transfers issued at settlement
    pub transfers: Vec<SettlementTransfer>,
    /// When the escrow was funded
    pub funded_at: DateTime<Utc>,
    /// When funds moved out
    pub settled_at: Option<DateTime<Utc>>,
}

/// One leg of an escrow settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementTransfer {
    /// External transfer reference
    pub transfer_id: TransferId,
    /// Destination agent
    pub destination: AgentId,
    /// Amount moved, smallest currency unit
    pub amount_cents: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settled_states() {
        assert!(!EscrowState::Funded.is_settled());
        assert!(EscrowState::Released.is_settled());
        assert!(EscrowState::Refunded.is_settled());
        assert!(EscrowState::Split.is_settled());
    }
}
