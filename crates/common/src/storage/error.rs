//! Storage error types
//!
//! Defines error types for the key-value layer, integrating with the
//! workspace error classification.

use thiserror::Error;

use crate::error::{ErrorClassification, ErrorSeverity};

/// Storage error type
#[derive(Debug, Error)]
pub enum StorageError {
    /// A stored value could not be decoded into the expected shape.
    #[error("Corrupt record under key {key}: {reason}")]
    CorruptRecord { key: String, reason: String },

    /// The backend failed for a reason other than I/O.
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

/// Storage result type
pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Build a [`StorageError::CorruptRecord`] for `key`.
    pub fn corrupt(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::CorruptRecord { key: key.into(), reason: reason.to_string() }
    }
}

impl ErrorClassification for StorageError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
            ),
            Self::Backend(_) => true,
            Self::CorruptRecord { .. } | Self::SerdeJson(_) => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::CorruptRecord { .. } => ErrorSeverity::Warning,
            Self::Backend(_) | Self::Io(_) | Self::SerdeJson(_) => ErrorSeverity::Error,
        }
    }
}
