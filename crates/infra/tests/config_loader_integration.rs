//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files and
//! handing it to the token client.

use std::io::Write;

use gcal_infra::config;
use gcal_infra::GoogleTokenClient;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_json_file() {
    let json_content = r#"{
        "client_id": "1234.apps.googleusercontent.com",
        "client_secret": "integration-secret",
        "redirect_uri": "http://127.0.0.1:8085/callback",
        "scopes": [
            "https://www.googleapis.com/auth/calendar",
            "https://www.googleapis.com/auth/calendar.events"
        ]
    }"#;

    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(json_content.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension("json");
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");

    let result = config::load_from_file(Some(path.clone()));
    assert!(result.is_ok(), "Failed to load config from JSON file");

    let config = result.unwrap();
    assert_eq!(config.client_id, "1234.apps.googleusercontent.com");
    assert_eq!(config.redirect_uri, "http://127.0.0.1:8085/callback");
    assert_eq!(config.scopes.len(), 2);
    assert_eq!(config.token_endpoint, "https://oauth2.googleapis.com/token");

    assert!(GoogleTokenClient::new(&config).is_ok());

    // Cleanup
    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_config_from_toml_file() {
    let toml_content = r#"
client_id = "5678.apps.googleusercontent.com"
client_secret = "toml-secret"
redirect_uri = "http://localhost:9004/oauth2callback"
scopes = ["https://www.googleapis.com/auth/calendar.readonly"]
authorization_endpoint = "http://localhost:9000/auth"
"#;

    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(toml_content.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension("toml");
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");

    let config = config::load_from_file(Some(path.clone())).expect("Failed to load TOML config");
    assert_eq!(config.client_secret, "toml-secret");
    assert_eq!(config.authorization_endpoint, "http://localhost:9000/auth");
    assert_eq!(config.scope_string(), "https://www.googleapis.com/auth/calendar.readonly");

    // Cleanup
    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_config_rejects_incomplete_file() {
    let json_content = r#"{
        "client_id": "",
        "client_secret": "secret",
        "redirect_uri": "http://127.0.0.1:8085/callback",
        "scopes": []
    }"#;

    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(json_content.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension("json");
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");

    let result = config::load_from_file(Some(path.clone()));
    assert!(result.is_err(), "Empty client id and scopes must be rejected");

    // Cleanup
    std::fs::remove_file(path).ok();
}
