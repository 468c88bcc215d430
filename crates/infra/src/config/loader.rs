//! Configuration loader
//!
//! Loads the OAuth client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `GCAL_CLIENT_ID`: OAuth client id (required)
//! - `GCAL_CLIENT_SECRET`: OAuth client secret (required)
//! - `GCAL_REDIRECT_URI`: Registered callback URL (required)
//! - `GCAL_SCOPES`: Scopes, separated by commas or whitespace (required)
//! - `GCAL_AUTH_ENDPOINT`: Authorization endpoint override
//! - `GCAL_TOKEN_ENDPOINT`: Token endpoint override
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./gcal.json`, `./gcal.toml`, `./config.json`, `./config.toml`
//! 2. The same names next to the executable

use std::path::{Path, PathBuf};

use gcal_domain::{AuthError, AuthResult, OAuthConfig};

const CONFIG_FILE_NAMES: [&str; 4] = ["gcal.json", "gcal.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `AuthError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The loaded configuration fails validation
pub fn load() -> AuthResult<OAuthConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `AuthError::Config` if required variables are missing or the
/// result fails validation.
pub fn load_from_env() -> AuthResult<OAuthConfig> {
    let mut config = OAuthConfig::google(
        env_var("GCAL_CLIENT_ID")?,
        env_var("GCAL_CLIENT_SECRET")?,
        env_var("GCAL_REDIRECT_URI")?,
        parse_scopes(&env_var("GCAL_SCOPES")?),
    );
    if let Some(endpoint) = optional_env_var("GCAL_AUTH_ENDPOINT") {
        config.authorization_endpoint = endpoint;
    }
    if let Some(endpoint) = optional_env_var("GCAL_TOKEN_ENDPOINT") {
        config.token_endpoint = endpoint;
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Format is detected by
/// file extension.
///
/// # Errors
/// Returns `AuthError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid or the result fails validation
pub fn load_from_file(path: Option<PathBuf>) -> AuthResult<OAuthConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(AuthError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            AuthError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| AuthError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> AuthResult<OAuthConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| AuthError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| AuthError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(AuthError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Split a scope list on commas and whitespace.
fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Get required environment variable
fn env_var(key: &str) -> AuthResult<String> {
    optional_env_var(key)
        .ok_or_else(|| AuthError::Config(format!("Missing required environment variable: {key}")))
}

/// Non-empty environment variable, if set
fn optional_env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
