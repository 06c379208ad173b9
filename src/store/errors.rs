//! Data store error types.

use thiserror::Error;

/// Errors raised by a [`DataStore`](super::DataStore) adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Embedded database operation failed.
    #[error("database error: {reason}")]
    Database { reason: String },

    /// The store endpoint could not be reached.
    #[error("store request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// Non-2xx response from the store endpoint.
    #[error("store returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// A row or filter referenced a column the table does not have.
    #[error("unknown column '{column}' on table '{table}'")]
    UnknownColumn { table: String, column: String },

    /// A value could not be stored in the target column.
    #[error("invalid value for column '{column}': {reason}")]
    InvalidValue { column: String, reason: String },

    /// Row (de)serialization failed.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },
}

impl StoreError {
    /// Whether an idempotent operation may be retried after this error.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Transport { .. }
                | StoreError::Http { status: 429, .. }
                | StoreError::Http {
                    status: 500..=504,
                    ..
                }
        )
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database {
            reason: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(StoreError::Transport {
            url: "http://x".into(),
            reason: "refused".into()
        }
        .is_transient());
        assert!(StoreError::Http {
            status: 503,
            body: String::new()
        }
        .is_transient());
        assert!(StoreError::Http {
            status: 429,
            body: String::new()
        }
        .is_transient());
    }

    #[test]
    fn test_permanent_errors() {
        assert!(!StoreError::Http {
            status: 400,
            body: "bad filter".into()
        }
        .is_transient());
        assert!(!StoreError::UnknownColumn {
            table: "shifts".into(),
            column: "nope".into()
        }
        .is_transient());
    }
}
