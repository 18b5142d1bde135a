//! Error types for the creature cache.
//!
//! Store failures are the only errors the cache itself ever returns, and it
//! returns them unchanged. A missing creature is not an error; see
//! [`CreatureLookupResult::NotFound`](crate::types::CreatureLookupResult::NotFound).

use thiserror::Error;

/// Result type alias using `CreatureError`.
pub type Result<T> = std::result::Result<T, CreatureError>;

/// Main error type for all creature operations.
#[derive(Debug, Error)]
pub enum CreatureError {
    // ═══════════════════════════════════════════════════════════════════════════
    // STORE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The store could not be reached.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store rejected or failed to run a query.
    #[error("Store query failed: {0}")]
    QueryFailed(String),

    /// The store refused a write because it violates a constraint.
    #[error("Store constraint violated: {0}")]
    ConstraintViolation(String),

    /// Any other store-level failure.
    #[error("Store error: {0}")]
    StoreError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // PERSISTENCE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Persisted store file is malformed.
    #[error("Invalid store file: {0}")]
    InvalidStoreFile(String),

    /// Persisted store file was written by an incompatible version.
    #[error("Store file version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Internal invariant violation (should never happen).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl CreatureError {
    /// Returns true if this error came from the backing store.
    ///
    /// These are the failures a caching layer passes through untouched.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            CreatureError::StoreUnavailable(_)
                | CreatureError::QueryFailed(_)
                | CreatureError::ConstraintViolation(_)
                | CreatureError::StoreError(_)
                | CreatureError::IoError(_)
                | CreatureError::InvalidStoreFile(_)
                | CreatureError::VersionMismatch { .. }
        )
    }

    /// Returns true if retrying the same call later may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CreatureError::StoreUnavailable(_) | CreatureError::IoError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_error_display() {
        let err = CreatureError::VersionMismatch {
            expected: 1,
            actual: 7,
        };
        assert!(err.to_string().contains('1'));
        assert!(err.to_string().contains('7'));
    }

    #[test_case(CreatureError::StoreUnavailable("down".into()), true, true ; "unavailable")]
    #[test_case(CreatureError::QueryFailed("syntax".into()), true, false ; "query failed")]
    #[test_case(CreatureError::ConstraintViolation("unique".into()), true, false ; "constraint")]
    #[test_case(CreatureError::ConfigError("ttl".into()), false, false ; "config")]
    #[test_case(CreatureError::InternalError("oops".into()), false, false ; "internal")]
    fn test_error_classification(err: CreatureError, store_failure: bool, recoverable: bool) {
        assert_eq!(err.is_store_failure(), store_failure);
        assert_eq!(err.is_recoverable(), recoverable);
    }

    #[test]
    fn test_json_error_conversion() {
        let json_result: std::result::Result<serde_json::Value, _> = serde_json::from_str("invalid");
        let result: Result<serde_json::Value> = json_result.map_err(CreatureError::from);
        assert!(matches!(result, Err(CreatureError::JsonError(_))));
    }
}
