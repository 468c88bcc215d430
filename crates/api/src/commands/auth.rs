//! Session commands

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use gcal_core::TokenAvailability;
use gcal_domain::{AuthResult, Readiness, StateRecord};
use gcal_infra::CallbackServer;
use serde::Serialize;
use tracing::info;
use url::Url;

use crate::context::AppContext;

/// Snapshot of the stored session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub readiness: Readiness,
    pub token: &'static str,
    pub expires_at: Option<DateTime<Utc>>,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let readiness = match self.readiness {
            Readiness::Authenticated => "authenticated",
            Readiness::Unauthenticated => "not authenticated",
            Readiness::Unknown => "unknown",
        };
        write!(f, "{readiness} (token: {})", self.token)?;
        if let Some(at) = self.expires_at {
            write!(f, ", expires {}", at.to_rfc3339())?;
        }
        Ok(())
    }
}

/// Run the browser authorization flow.
///
/// `on_link` receives the provider URL to open. `server` must already be
/// serving the redirect URI the context was configured with.
pub async fn login<F>(
    ctx: &AppContext,
    server: &mut CallbackServer,
    return_to: &str,
    timeout: Duration,
    on_link: F,
) -> AuthResult<StateRecord>
where
    F: FnOnce(&Url),
{
    let link = ctx.manager.authorization_link(return_to).await?;
    on_link(&link);

    let params = server.wait(timeout).await?;
    let state = ctx.manager.complete_callback(&params).await?;
    info!("Login completed");
    Ok(state)
}

pub async fn status(ctx: &AppContext) -> AuthResult<StatusReport> {
    let availability = ctx.manager.availability().await?;
    let expires_at = match &availability {
        TokenAvailability::Available(record) => record.expires_at,
        _ => None,
    };
    Ok(StatusReport { readiness: ctx.manager.readiness(), token: availability.label(), expires_at })
}

/// The `Authorization` header value.
pub async fn header(ctx: &AppContext) -> AuthResult<String> {
    ctx.manager.get_authorization_header().await
}

/// Returns whether a token existed to expire.
pub async fn expire(ctx: &AppContext) -> AuthResult<bool> {
    ctx.manager.force_expire().await
}

pub async fn logout(ctx: &AppContext) -> AuthResult<()> {
    ctx.manager.logout().await
}

#[cfg(test)]
mod tests {
    //! Unit tests for commands::auth.
    use chrono::TimeZone;

    use super::*;

    /// Validates `StatusReport` rendering.
    ///
    /// Assertions:
    /// - Ensures the expiry is shown when known.
    /// - Ensures it is omitted otherwise.
    #[test]
    fn test_status_report_display() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let report = StatusReport {
            readiness: Readiness::Authenticated,
            token: "available",
            expires_at: Some(at),
        };
        assert_eq!(
            report.to_string(),
            "authenticated (token: available), expires 2026-01-02T03:04:05+00:00"
        );

        let report =
            StatusReport { readiness: Readiness::Unauthenticated, token: "none", expires_at: None };
        assert_eq!(report.to_string(), "not authenticated (token: none)");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["readiness"], "unauthenticated");
        assert_eq!(json["token"], "none");
        assert!(json["expires_at"].is_null());
    }
}
