//! # gcal-auth
//!
//! Command-line front end for the Google OAuth token lifecycle: browser
//! login over a loopback callback, status, header retrieval, forced
//! expiry and logout.

pub mod cli;
pub mod commands;
pub mod context;
pub mod utils;

use std::time::{Duration, Instant};

use anyhow::Context as _;
use gcal_domain::{AuthError, OAuthConfig};
use gcal_infra::{config, CallbackServer};

pub use cli::{Cli, Command};
pub use context::AppContext;

use crate::utils::logging::{error_label, log_command_execution};

/// Execute one parsed invocation, printing its result to stdout.
///
/// # Errors
/// Any configuration, storage, network or authorization failure, with
/// context for the user.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => config::load_from_file(Some(path.clone())),
        None => config::load(),
    }
    .context("failed to load OAuth client configuration")?;

    let name = cli.command.name();
    let started = Instant::now();
    let result = dispatch(cli, config).await;

    let label = result
        .as_ref()
        .err()
        .and_then(|err| err.downcast_ref::<AuthError>())
        .map(error_label);
    log_command_execution(name, started.elapsed(), result.is_ok(), label);
    result
}

async fn dispatch(cli: Cli, mut config: OAuthConfig) -> anyhow::Result<()> {
    match cli.command {
        Command::Login { return_to, timeout } => {
            let mut server = CallbackServer::start(&config.redirect_uri)
                .await
                .context("failed to start the callback server")?;
            config.redirect_uri = server.redirect_uri();

            let ctx = AppContext::new(config, &cli.store).await?;
            let state = commands::login(
                &ctx,
                &mut server,
                &return_to,
                Duration::from_secs(timeout),
                |link| println!("Open this link in a browser to authorize:\n\n  {link}\n"),
            )
            .await?;
            server.shutdown().await?;
            println!("Logged in. Continue at {}", state.redirect_url);
        }
        Command::Status { json } => {
            let ctx = AppContext::new(config, &cli.store).await?;
            let report = commands::status(&ctx).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{report}");
            }
        }
        Command::Header => {
            let ctx = AppContext::new(config, &cli.store).await?;
            println!("{}", commands::header(&ctx).await?);
        }
        Command::Expire => {
            let ctx = AppContext::new(config, &cli.store).await?;
            if commands::expire(&ctx).await? {
                println!("Token expired; the next use will refresh it.");
            } else {
                println!("No stored token.");
            }
        }
        Command::Logout => {
            let ctx = AppContext::new(config, &cli.store).await?;
            commands::logout(&ctx).await?;
            println!("Logged out.");
        }
    }
    Ok(())
}
