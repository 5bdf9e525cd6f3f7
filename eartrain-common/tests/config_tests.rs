//! Config file loading tests
//!
//! Tests that point `XDG_CONFIG_HOME` at a temporary directory are marked
//! `#[serial]` so they never race on the environment.

use eartrain_common::config::{
    default_config_path, load_toml_config, ConfigOverrides, ServerConfig,
};
use eartrain_common::Error;
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_explicit_file_loaded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("eartrain.toml");
    fs::write(
        &path,
        r#"
        bind_addr = "0.0.0.0:8080"
        frontend_url = "https://ear.example.com"
        reset_token_ttl_minutes = 30

        [google]
        client_id = "cid"
        client_secret = "csecret"
        redirect_uri = "https://api.example.com/api/auth/google/callback"

        [logging]
        level = "debug"
        "#,
    )
    .unwrap();

    let toml = load_toml_config(Some(&path)).unwrap();
    let config = ServerConfig::resolve(&ConfigOverrides::default(), &toml).unwrap();

    assert_eq!(config.bind_addr, "0.0.0.0:8080");
    assert_eq!(config.frontend_url, "https://ear.example.com");
    assert_eq!(config.reset_token_ttl_minutes, 30);
    assert_eq!(config.log_level, "debug");
    let google = config.google.unwrap();
    assert_eq!(google.client_id, "cid");
    assert_eq!(
        google.redirect_uri,
        "https://api.example.com/api/auth/google/callback"
    );
}

#[test]
fn test_explicit_missing_file_is_error() {
    let dir = TempDir::new().unwrap();
    let result = load_toml_config(Some(&dir.path().join("absent.toml")));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_malformed_file_is_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "bind_addr = [unterminated").unwrap();

    let result = load_toml_config(Some(&path));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_missing_default_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let previous = env::var_os("XDG_CONFIG_HOME");
    env::set_var("XDG_CONFIG_HOME", dir.path());

    let toml = load_toml_config(None).unwrap();
    assert!(toml.bind_addr.is_none());
    assert!(toml.google.client_id.is_none());

    match previous {
        Some(value) => env::set_var("XDG_CONFIG_HOME", value),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }
}

#[cfg(target_os = "linux")]
#[test]
#[serial]
fn test_default_location_used_when_present() {
    let dir = TempDir::new().unwrap();
    let previous = env::var_os("XDG_CONFIG_HOME");
    env::set_var("XDG_CONFIG_HOME", dir.path());

    let path = default_config_path().unwrap();
    assert!(path.starts_with(dir.path()));
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "purge_interval_secs = 30\n").unwrap();

    let toml = load_toml_config(None).unwrap();
    assert_eq!(toml.purge_interval_secs, Some(30));

    match previous {
        Some(value) => env::set_var("XDG_CONFIG_HOME", value),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }
}
