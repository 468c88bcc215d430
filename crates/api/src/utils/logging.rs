use std::time::Duration;

use gcal_domain::AuthError;
use tracing::{info, warn};

/// Log the outcome of a command with structured fields.
///
/// `command` must be a stable identifier; never pass token material.
#[inline]
pub fn log_command_execution(
    command: &str,
    elapsed: Duration,
    success: bool,
    error: Option<&'static str>,
) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    if success {
        info!(command, duration_ms, "command_execution_success");
    } else {
        warn!(command, duration_ms, error = error.unwrap_or("other"), "command_execution_failure");
    }
}

/// Stable label for an [`AuthError`], suitable for logs.
#[inline]
pub fn error_label(error: &AuthError) -> &'static str {
    match error {
        AuthError::AccessTokenNotFound => "access_token_not_found",
        AuthError::SecurityTokenNotFound(_) => "security_token_not_found",
        AuthError::AuthorizationResponse(_) => "authorization_response",
        AuthError::InvalidCallback(_) => "invalid_callback",
        AuthError::CorruptRecord { .. } => "corrupt_record",
        AuthError::Provider { .. } => "provider",
        AuthError::Transport(_) => "transport",
        AuthError::Storage(_) => "storage",
        AuthError::Config(_) => "config",
        AuthError::Internal(_) => "internal",
    }
}
