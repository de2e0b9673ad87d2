//! Operation envelope
//!
//! Every exposed operation answers with a discriminated success/error
//! envelope. Error payloads carry the stable machine code plus a
//! human-readable message; internals never leak to callers.

use resolve_types::{ResolveError, Result};
use serde::Serialize;

/// Discriminated result of an exposed operation
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    /// The operation succeeded
    Ok { data: T },
    /// The operation failed
    Err { code: String, message: String },
}

impl<T> Outcome<T> {
    /// Wrap a domain result
    pub fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::Ok { data },
            Err(error) => Self::from_error(error),
        }
    }

    /// Wrap a domain error
    pub fn from_error(error: ResolveError) -> Self {
        Self::Err {
            code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }

    /// Whether this is a success
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// The payload, if successful
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Ok { data } => Some(data),
            Self::Err { .. } => None,
        }
    }

    /// The error code, if failed
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Ok { .. } => None,
            Self::Err { code, .. } => Some(code),
        }
    }

    /// Consume into the payload, panicking on error (test helper)
    pub fn into_data(self) -> T {
        match self {
            Self::Ok { data } => data,
            Self::Err { code, message } => {
                panic!("operation failed with {}: {}", code, message)
            }
        }
    }
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        Self::from_result(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_carries_code() {
        let outcome: Outcome<()> = Outcome::from_error(ResolveError::AgentNotFound {
            agent_id: "agent_x".to_string(),
        });
        assert!(!outcome.is_ok());
        assert_eq!(outcome.error_code(), Some("AGENT_NOT_FOUND"));
    }

    #[test]
    fn test_ok_envelope_carries_data() {
        let outcome = Outcome::from_result(Ok(41));
        assert!(outcome.is_ok());
        assert_eq!(outcome.data(), Some(&41));
    }
}
