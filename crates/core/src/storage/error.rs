//! Storage error types.

use thiserror::Error;

/// Errors raised by a ledger store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("store lock poisoned: {0}")]
    Poisoned(String),

    /// A record with the same key already exists and records of this kind are immutable.
    #[error("{entity} {key} already exists")]
    Conflict {
        /// Record kind, e.g. `journal`.
        entity: &'static str,
        /// The duplicated key.
        key: String,
    },

    /// A batch referenced an account the store does not hold.
    #[error("account {0} is not stored")]
    MissingAccount(String),

    /// Backend-specific failure.
    #[error("storage operation failed: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a conflict error.
    #[must_use]
    pub fn conflict(entity: &'static str, key: impl Into<String>) -> Self {
        Self::Conflict {
            entity,
            key: key.into(),
        }
    }

    /// Create a poisoned-lock error.
    #[must_use]
    pub fn poisoned(what: impl Into<String>) -> Self {
        Self::Poisoned(what.into())
    }
}
