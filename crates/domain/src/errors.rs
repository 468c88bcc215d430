//! Error types for the token lifecycle

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use gcal_common::error::{ErrorClassification, ErrorSeverity};
use gcal_common::storage::StorageError;
use thiserror::Error;

/// Failure surfaced by any auth operation.
///
/// Cloneable so a single in-flight refresh can hand the same outcome to
/// every caller waiting on it.
#[derive(Error, Debug, Clone)]
pub enum AuthError {
    /// No usable token exists; the user must go through authorization.
    #[error("Access token not found: authorization required")]
    AccessTokenNotFound,

    /// A callback named a security token with no pending attempt.
    #[error("Security token not found: {0}")]
    SecurityTokenNotFound(String),

    /// The provider reported an authorization failure on the callback.
    /// Carries the provider's message verbatim.
    #[error("{0}")]
    AuthorizationResponse(String),

    /// Callback parameters were missing or malformed.
    #[error("Invalid callback: {0}")]
    InvalidCallback(String),

    /// A persisted record or a token endpoint response failed to decode.
    #[error("Corrupt record under key {key}: {reason}")]
    CorruptRecord { key: String, reason: String },

    /// The token endpoint answered with an OAuth error body.
    #[error("Token endpoint rejected request ({status}): {error}")]
    Provider { status: u16, error: String, description: Option<String> },

    /// The token endpoint could not be reached.
    #[error("Token endpoint request failed: {0}")]
    Transport(#[source] Arc<dyn StdError + Send + Sync>),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for auth operations
pub type AuthResult<T> = std::result::Result<T, AuthError>;

impl AuthError {
    /// Wrap a transport-level failure.
    pub fn transport(err: impl StdError + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }

    /// Build a [`AuthError::CorruptRecord`] for `key`.
    pub fn corrupt(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::CorruptRecord { key: key.into(), reason: reason.to_string() }
    }

    /// Whether the caller must (re)run the authorization flow to recover.
    pub fn requires_authorization(&self) -> bool {
        matches!(
            self,
            Self::AccessTokenNotFound
                | Self::SecurityTokenNotFound(_)
                | Self::AuthorizationResponse(_)
        ) || matches!(self, Self::Provider { error, .. } if error == "invalid_grant")
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::CorruptRecord { key, reason } => Self::CorruptRecord { key, reason },
            other => Self::Storage(other.to_string()),
        }
    }
}

impl ErrorClassification for AuthError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Storage(_) => true,
            Self::Provider { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::AccessTokenNotFound => ErrorSeverity::Info,
            Self::SecurityTokenNotFound(_)
            | Self::AuthorizationResponse(_)
            | Self::InvalidCallback(_)
            | Self::CorruptRecord { .. } => ErrorSeverity::Warning,
            Self::Provider { .. } | Self::Transport(_) | Self::Storage(_) => ErrorSeverity::Error,
            Self::Config(_) | Self::Internal(_) => ErrorSeverity::Critical,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Provider { status: 429, .. } => Some(Duration::from_secs(1)),
            _ => None,
        }
    }
}
