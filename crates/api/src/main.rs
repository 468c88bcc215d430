//! `gcal-auth` entry point

use clap::Parser;
use gcal_app::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env must be loaded before clap reads env-backed flags.
    let dotenv = dotenvy::dotenv();
    gcal_infra::init_tracing("info");
    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(error = %err, "Could not load .env file"),
    }

    gcal_app::run(Cli::parse()).await
}
