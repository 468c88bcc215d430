//! Command-line surface of `gcal-auth`

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Manage the Google OAuth session used for calendar access.
#[derive(Debug, Parser)]
#[command(name = "gcal-auth", version)]
pub struct Cli {
    /// File holding the token and pending authorization records.
    #[arg(long, env = "GCAL_STORE", default_value = "gcal-store.json", global = true)]
    pub store: PathBuf,

    /// JSON or TOML client configuration. Without it the environment is
    /// tried first, then the standard file locations.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Authorize in the browser and store the resulting tokens.
    Login {
        /// Where the application should land once authorized.
        #[arg(long, default_value = "/")]
        return_to: String,
        /// Seconds to wait for the browser callback.
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },
    /// Show readiness and token expiry.
    Status {
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the authorization header, refreshing the token if needed.
    Header,
    /// Expire the stored token so the next use refreshes it.
    Expire,
    /// Delete the stored token.
    Logout,
}

impl Command {
    /// Stable identifier for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "login",
            Self::Status { .. } => "status",
            Self::Header => "header",
            Self::Expire => "expire",
            Self::Logout => "logout",
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cli.
    use super::*;

    /// Validates argument parsing for `login`.
    ///
    /// Assertions:
    /// - Ensures defaults apply when flags are omitted.
    /// - Ensures global flags are accepted after the subcommand.
    #[test]
    fn test_parse_login() {
        let cli = Cli::try_parse_from(["gcal-auth", "login"]).unwrap();
        assert_eq!(cli.command, Command::Login { return_to: "/".into(), timeout: 300 });

        let cli = Cli::try_parse_from([
            "gcal-auth",
            "login",
            "--return-to",
            "/calendar",
            "--timeout",
            "30",
            "--store",
            "/tmp/tokens.json",
        ])
        .unwrap();
        assert_eq!(cli.command, Command::Login { return_to: "/calendar".into(), timeout: 30 });
        assert_eq!(cli.store, PathBuf::from("/tmp/tokens.json"));
        assert_eq!(cli.command.name(), "login");
    }

    /// Validates that a subcommand is required.
    ///
    /// Assertions:
    /// - Ensures parsing without a subcommand fails.
    /// - Ensures unknown subcommands fail.
    #[test]
    fn test_parse_requires_subcommand() {
        assert!(Cli::try_parse_from(["gcal-auth"]).is_err());
        assert!(Cli::try_parse_from(["gcal-auth", "revoke"]).is_err());
        assert_eq!(Cli::try_parse_from(["gcal-auth", "expire"]).unwrap().command, Command::Expire);
        assert_eq!(
            Cli::try_parse_from(["gcal-auth", "status", "--json"]).unwrap().command,
            Command::Status { json: true }
        );
    }
}
