//! Identity types for Resolve
//!
//! All identity types are strongly typed wrappers around UUIDs to prevent
//! accidental mixing of different ID types.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Macro to generate ID types with common implementations
macro_rules! define_id_type {
    ($name:ident, $prefix:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Parse from a string (with or without prefix)
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                let s = s.strip_prefix(concat!($prefix, "_")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }

            /// Get the inner UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }
    };
}

// Principal identity types
define_id_type!(AgentId, "agent", "Unique identifier for a registered agent");
define_id_type!(OperatorId, "op", "Unique identifier for the operator account owning agents");

// Dispute identity types
define_id_type!(DisputeId, "dispute", "Unique identifier for a dispute");
define_id_type!(EvidenceId, "evidence", "Unique identifier for an evidence entry");
define_id_type!(EscalationId, "escalation", "Unique identifier for a human escalation");
define_id_type!(ComparisonId, "comparison", "Unique identifier for an AI/human accuracy comparison");

// Reputation identity types
define_id_type!(TrustEntryId, "trust", "Unique identifier for a trust history entry");

// Feedback identity types
define_id_type!(FeedbackId, "feedback", "Unique identifier for a decision feedback entry");
define_id_type!(MetricsId, "metrics", "Unique identifier for a decision engine metrics period");

// Value movement identity types
define_id_type!(TransactionId, "tx", "Unique identifier for an agent-to-agent transaction");
define_id_type!(EscrowId, "escrow", "Unique identifier for an escrow account");
define_id_type!(TransferId, "transfer", "Unique identifier for an external payout transfer");

// Audit identity types
define_id_type!(AuditEntryId, "audit", "Unique identifier for an audit log entry");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_creation() {
        let id = AgentId::new();
        let s = id.to_string();
        assert!(s.starts_with("agent_"));
    }

    #[test]
    fn test_id_parsing() {
        let id = DisputeId::new();
        let s = id.to_string();
        let parsed = DisputeId::parse(&s).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_id_parsing_without_prefix() {
        let id = EscrowId::new();
        let parsed = EscrowId::parse(&id.0.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_id_equality() {
        let uuid = Uuid::new_v4();
        let id1 = AgentId::from_uuid(uuid);
        let id2 = AgentId::from_uuid(uuid);
        assert_eq!(id1, id2);
    }
}
