//! Error types for Resolve
//!
//! Every failure is explicit and carries a stable machine-readable code for
//! the operation envelope. Dependent-capability failures stay distinct from
//! local validation so callers can decide whether to retry, resubmit, or
//! escalate.

use thiserror::Error;

/// Result type for Resolve operations
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Resolve error types
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    // ========================================================================
    // Agent Errors
    // ========================================================================

    /// Agent not found
    #[error("Agent {agent_id} not found")]
    AgentNotFound { agent_id: String },

    /// Agent already registered for this operator/reference pair
    #[error("Agent {external_ref} is already registered under operator {operator_id}")]
    AlreadyRegistered {
        operator_id: String,
        external_ref: String,
    },

    /// Agent suspended
    #[error("Agent {agent_id} is suspended")]
    AgentSuspended { agent_id: String },

    // ========================================================================
    // Dispute Errors
    // ========================================================================

    /// Dispute not found
    #[error("Dispute {dispute_id} not found")]
    DisputeNotFound { dispute_id: String },

    /// Caller is neither claimant nor respondent
    #[error("Agent {agent_id} is not a party to dispute {dispute_id}")]
    NotParty { agent_id: String, dispute_id: String },

    /// Action not legal in the dispute's current state
    #[error("Cannot {action} dispute {dispute_id} in state {status}")]
    InvalidDisputeState {
        dispute_id: String,
        status: String,
        action: String,
    },

    /// Monthly dispute quota exhausted
    #[error("Agent {agent_id} cannot file: {disputes_this_month} of {limit} monthly disputes used")]
    CannotFileDispute {
        agent_id: String,
        disputes_this_month: u32,
        limit: u32,
    },

    /// A party has already accepted or rejected this ruling
    #[error("Agent {agent_id} has already responded to the ruling on dispute {dispute_id}")]
    DecisionAlreadyRecorded {
        dispute_id: String,
        agent_id: String,
    },

    // ========================================================================
    // Evidence Errors
    // ========================================================================

    /// Evidence content exceeds the size cap
    #[error("Evidence content is {size} chars, limit is {limit}")]
    EvidenceTooLarge { size: usize, limit: usize },

    /// Text extraction from an uploaded file failed
    #[error("Could not extract text from {filename}: {reason}. Resubmit the evidence as text.")]
    ExtractionFailed { filename: String, reason: String },

    // ========================================================================
    // Arbitration Errors
    // ========================================================================

    /// The AI ruling capability failed or is unreachable
    #[error("Arbitration capability unavailable: {reason}")]
    ArbitrationUnavailable { reason: String },

    // ========================================================================
    // Escalation Errors
    // ========================================================================

    /// No escalation exists for the dispute
    #[error("No escalation found for dispute {dispute_id}")]
    EscalationNotFound { dispute_id: String },

    /// Escalation already carries a human ruling
    #[error("Escalation {escalation_id} has already been resolved")]
    EscalationAlreadyResolved { escalation_id: String },

    // ========================================================================
    // Feedback Errors
    // ========================================================================

    /// Feedback submitted outside the post-closure window
    #[error("Feedback window for dispute {dispute_id} closed at {window_closed_at}")]
    FeedbackWindowClosed {
        dispute_id: String,
        window_closed_at: String,
    },

    /// Feedback already submitted by this party
    #[error("Agent {agent_id} already submitted feedback for dispute {dispute_id}")]
    FeedbackAlreadySubmitted {
        dispute_id: String,
        agent_id: String,
    },

    /// Rating outside the 1-5 scale
    #[error("Rating {field} must be between 1 and 5, got {value}")]
    InvalidRating { field: String, value: u8 },

    // ========================================================================
    // Credit Errors
    // ========================================================================

    /// Operator balance cannot cover the filing fee
    #[error("Insufficient credits: required {required}, available {available}")]
    InsufficientCredits { required: i64, available: i64 },

    // ========================================================================
    // Escrow Errors
    // ========================================================================

    /// Escrow not found for transaction
    #[error("No escrow found for transaction {transaction_id}")]
    EscrowNotFound { transaction_id: String },

    /// Escrow already released or refunded
    #[error("Escrow for transaction {transaction_id} has already been released")]
    EscrowAlreadyReleased { transaction_id: String },

    /// Release destination not authorized by the ruling
    #[error("Release of escrow for transaction {transaction_id} not authorized: {reason}")]
    ReleaseNotAuthorized {
        transaction_id: String,
        reason: String,
    },

    /// External transfer capability failed
    #[error("Transfer failed: {reason}")]
    TransferFailed { reason: String },

    // ========================================================================
    // General Errors
    // ========================================================================

    /// Invalid input
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    /// Stored data contradicts a structural invariant
    #[error("Data integrity violation: {message}")]
    DataIntegrity { message: String },

    /// A structural invariant was violated mid-operation
    #[error("Invariant violation: {message}")]
    InvariantViolation { message: String },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ResolveError {
    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a retriable error
    ///
    /// Dependent-capability failures can be retried or resubmitted; local
    /// validation, authorization and state errors cannot.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::ArbitrationUnavailable { .. }
                | Self::ExtractionFailed { .. }
                | Self::TransferFailed { .. }
                | Self::Internal { .. }
        )
    }

    /// Get an error code for operation envelopes
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AgentNotFound { .. } => "AGENT_NOT_FOUND",
            Self::AlreadyRegistered { .. } => "ALREADY_REGISTERED",
            Self::AgentSuspended { .. } => "AGENT_SUSPENDED",
            Self::DisputeNotFound { .. } => "DISPUTE_NOT_FOUND",
            Self::NotParty { .. } => "NOT_PARTY",
            Self::InvalidDisputeState { .. } => "INVALID_STATUS",
            Self::CannotFileDispute { .. } => "CANNOT_FILE_DISPUTE",
            Self::DecisionAlreadyRecorded { .. } => "DECISION_ALREADY_RECORDED",
            Self::EvidenceTooLarge { .. } => "EVIDENCE_TOO_LARGE",
            Self::ExtractionFailed { .. } => "EXTRACTION_FAILED",
            Self::ArbitrationUnavailable { .. } => "ARBITRATION_UNAVAILABLE",
            Self::EscalationNotFound { .. } => "ESCALATION_NOT_FOUND",
            Self::EscalationAlreadyResolved { .. } => "ESCALATION_ALREADY_RESOLVED",
            Self::FeedbackWindowClosed { .. } => "FEEDBACK_WINDOW_CLOSED",
            Self::FeedbackAlreadySubmitted { .. } => "FEEDBACK_ALREADY_SUBMITTED",
            Self::InvalidRating { .. } => "INVALID_RATING",
            Self::InsufficientCredits { .. } => "INSUFFICIENT_CREDITS",
            Self::EscrowNotFound { .. } => "ESCROW_NOT_FOUND",
            Self::EscrowAlreadyReleased { .. } => "ESCROW_ALREADY_RELEASED",
            Self::ReleaseNotAuthorized { .. } => "RELEASE_NOT_AUTHORIZED",
            Self::TransferFailed { .. } => "TRANSFER_FAILED",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::DataIntegrity { .. } => "DATA_INTEGRITY",
            Self::InvariantViolation { .. } => "INVARIANT_VIOLATION",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}
