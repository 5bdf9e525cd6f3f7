//! Configuration loading and resolution
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! The server's clap definition fills [`ConfigOverrides`] from tiers 1 and 2;
//! [`ServerConfig::resolve`] merges those over the TOML file and defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{Error, Result};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5780";
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_MAIL_FROM: &str = "EarTrain <no-reply@eartrain.local>";
pub const DEFAULT_RESET_TTL_MINUTES: i64 = 60;
pub const DEFAULT_PURGE_INTERVAL_SECS: u64 = 600;
/// Reset links live at most a week
pub const MAX_RESET_TTL_MINUTES: i64 = 7 * 24 * 60;
pub const MAX_PURGE_INTERVAL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ========================================
// TOML file
// ========================================

/// Contents of `config.toml`; every field optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub database_path: Option<PathBuf>,
    pub bind_addr: Option<String>,
    pub jwt_secret: Option<String>,
    pub frontend_url: Option<String>,
    pub reset_token_ttl_minutes: Option<i64>,
    pub purge_interval_secs: Option<u64>,
    #[serde(default)]
    pub google: GoogleSection,
    #[serde(default)]
    pub smtp: SmtpSection,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[google]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleSection {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
}

/// `[smtp]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmtpSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
}

/// `[logging]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

/// Default config file location: `<config dir>/eartrain/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("eartrain").join("config.toml"))
}

/// Default database location: `<local data dir>/eartrain/eartrain.db`
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("eartrain"))
        .unwrap_or_else(|| PathBuf::from("./eartrain_data"))
        .join("eartrain.db")
}

/// Load the TOML config file
///
/// An explicitly requested file must exist. When no path is given the default
/// location is tried and a missing file yields an empty config. A file that
/// exists but does not parse is always an error.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                info!("No config file found, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded config file: {}", path.display());
    Ok(config)
}

// ========================================
// Overrides (CLI + environment)
// ========================================

/// Values taken from command-line flags or environment variables
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_path: Option<PathBuf>,
    pub bind_addr: Option<String>,
    pub jwt_secret: Option<String>,
    pub frontend_url: Option<String>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_redirect_uri: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
}

// ========================================
// Resolved configuration
// ========================================

/// Google OAuth client settings
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Outgoing mail settings
#[derive(Debug, Clone, PartialEq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

/// Fully resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_path: PathBuf,
    pub bind_addr: String,
    /// `None` means the secret is generated and kept in the settings table
    pub jwt_secret: Option<String>,
    pub frontend_url: String,
    /// `None` disables Google sign-in
    pub google: Option<GoogleConfig>,
    /// `None` logs emails instead of sending them
    pub smtp: Option<SmtpConfig>,
    pub reset_token_ttl_minutes: i64,
    pub purge_interval_secs: u64,
    pub log_level: String,
}

/// First non-blank value wins
fn pick(values: [Option<&String>; 2]) -> Option<String> {
    values
        .into_iter()
        .flatten()
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

impl ServerConfig {
    /// Merge overrides over the TOML file over compiled defaults
    pub fn resolve(overrides: &ConfigOverrides, toml: &TomlConfig) -> Result<Self> {
        let database_path = overrides
            .database_path
            .clone()
            .or_else(|| toml.database_path.clone())
            .unwrap_or_else(default_database_path);

        let bind_addr = pick([overrides.bind_addr.as_ref(), toml.bind_addr.as_ref()])
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let jwt_secret = pick([overrides.jwt_secret.as_ref(), toml.jwt_secret.as_ref()]);

        let frontend_url = pick([overrides.frontend_url.as_ref(), toml.frontend_url.as_ref()])
            .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        if !(frontend_url.starts_with("http://") || frontend_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "frontend_url must be an http(s) URL, got '{}'",
                frontend_url
            )));
        }

        let google = Self::resolve_google(overrides, toml, &bind_addr);
        let smtp = Self::resolve_smtp(overrides, toml);

        let reset_token_ttl_minutes = toml
            .reset_token_ttl_minutes
            .unwrap_or(DEFAULT_RESET_TTL_MINUTES);
        if !(1..=MAX_RESET_TTL_MINUTES).contains(&reset_token_ttl_minutes) {
            return Err(Error::Config(format!(
                "reset_token_ttl_minutes must be between 1 and {}, got {}",
                MAX_RESET_TTL_MINUTES, reset_token_ttl_minutes
            )));
        }

        let purge_interval_secs = toml
            .purge_interval_secs
            .unwrap_or(DEFAULT_PURGE_INTERVAL_SECS);
        if !(1..=MAX_PURGE_INTERVAL_SECS).contains(&purge_interval_secs) {
            return Err(Error::Config(format!(
                "purge_interval_secs must be between 1 and {}, got {}",
                MAX_PURGE_INTERVAL_SECS, purge_interval_secs
            )));
        }

        let log_level = toml
            .logging
            .level
            .clone()
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Self {
            database_path,
            bind_addr,
            jwt_secret,
            frontend_url,
            google,
            smtp,
            reset_token_ttl_minutes,
            purge_interval_secs,
            log_level,
        })
    }

    fn resolve_google(
        overrides: &ConfigOverrides,
        toml: &TomlConfig,
        bind_addr: &str,
    ) -> Option<GoogleConfig> {
        let client_id = pick([
            overrides.google_client_id.as_ref(),
            toml.google.client_id.as_ref(),
        ]);
        let client_secret = pick([
            overrides.google_client_secret.as_ref(),
            toml.google.client_secret.as_ref(),
        ]);

        match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => {
                let redirect_uri = pick([
                    overrides.google_redirect_uri.as_ref(),
                    toml.google.redirect_uri.as_ref(),
                ])
                .unwrap_or_else(|| format!("http://{}/api/auth/google/callback", bind_addr));
                Some(GoogleConfig {
                    client_id,
                    client_secret,
                    redirect_uri,
                })
            }
            (Some(_), None) | (None, Some(_)) => {
                warn!("Google OAuth needs both client id and secret; Google sign-in disabled");
                None
            }
            (None, None) => None,
        }
    }

    fn resolve_smtp(overrides: &ConfigOverrides, toml: &TomlConfig) -> Option<SmtpConfig> {
        let host = pick([overrides.smtp_host.as_ref(), toml.smtp.host.as_ref()])?;
        Some(SmtpConfig {
            host,
            port: overrides
                .smtp_port
                .or(toml.smtp.port)
                .unwrap_or(DEFAULT_SMTP_PORT),
            username: pick([overrides.smtp_username.as_ref(), toml.smtp.username.as_ref()]),
            password: pick([overrides.smtp_password.as_ref(), toml.smtp.password.as_ref()]),
            from: pick([overrides.smtp_from.as_ref(), toml.smtp.from.as_ref()])
                .unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_nothing_configured() {
        let config = ServerConfig::resolve(&ConfigOverrides::default(), &TomlConfig::default())
            .unwrap();
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.frontend_url, DEFAULT_FRONTEND_URL);
        assert!(config.jwt_secret.is_none());
        assert!(config.google.is_none());
        assert!(config.smtp.is_none());
        assert_eq!(config.reset_token_ttl_minutes, 60);
        assert_eq!(config.database_path, default_database_path());
    }

    #[test]
    fn test_overrides_beat_toml() {
        let toml = TomlConfig {
            bind_addr: Some("0.0.0.0:9000".to_string()),
            jwt_secret: Some("from-toml".to_string()),
            ..Default::default()
        };
        let overrides = ConfigOverrides {
            jwt_secret: Some("from-env".to_string()),
            ..Default::default()
        };
        let config = ServerConfig::resolve(&overrides, &toml).unwrap();
        assert_eq!(config.jwt_secret.as_deref(), Some("from-env"));
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
    }

    #[test]
    fn test_blank_override_falls_through() {
        let toml = TomlConfig {
            frontend_url: Some("https://ear.example.com/".to_string()),
            ..Default::default()
        };
        let overrides = ConfigOverrides {
            frontend_url: Some("   ".to_string()),
            ..Default::default()
        };
        let config = ServerConfig::resolve(&overrides, &toml).unwrap();
        // trailing slash trimmed
        assert_eq!(config.frontend_url, "https://ear.example.com");
    }

    #[test]
    fn test_google_requires_id_and_secret() {
        let mut overrides = ConfigOverrides {
            google_client_id: Some("id".to_string()),
            ..Default::default()
        };
        let config = ServerConfig::resolve(&overrides, &TomlConfig::default()).unwrap();
        assert!(config.google.is_none());

        overrides.google_client_secret = Some("secret".to_string());
        let config = ServerConfig::resolve(&overrides, &TomlConfig::default()).unwrap();
        let google = config.google.unwrap();
        assert_eq!(
            google.redirect_uri,
            format!("http://{}/api/auth/google/callback", DEFAULT_BIND_ADDR)
        );
    }

    #[test]
    fn test_smtp_section_from_toml() {
        let toml: TomlConfig = toml::from_str(
            r#"
            [smtp]
            host = "smtp.example.com"
            port = 2525
            from = "Ear <ear@example.com>"
            "#,
        )
        .unwrap();
        let config = ServerConfig::resolve(&ConfigOverrides::default(), &toml).unwrap();
        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.host, "smtp.example.com");
        assert_eq!(smtp.port, 2525);
        assert_eq!(smtp.from, "Ear <ear@example.com>");
        assert!(smtp.username.is_none());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let toml = TomlConfig {
            frontend_url: Some("ftp://nope".to_string()),
            ..Default::default()
        };
        assert!(ServerConfig::resolve(&ConfigOverrides::default(), &toml).is_err());

        let toml = TomlConfig {
            reset_token_ttl_minutes: Some(0),
            ..Default::default()
        };
        assert!(ServerConfig::resolve(&ConfigOverrides::default(), &toml).is_err());
    }

    #[test]
    fn test_oversized_intervals_rejected() {
        let toml = TomlConfig {
            reset_token_ttl_minutes: Some(i64::MAX),
            ..Default::default()
        };
        let err = ServerConfig::resolve(&ConfigOverrides::default(), &toml).unwrap_err();
        assert!(err.to_string().contains("reset_token_ttl_minutes"));

        let toml = TomlConfig {
            purge_interval_secs: Some(u64::MAX),
            ..Default::default()
        };
        assert!(ServerConfig::resolve(&ConfigOverrides::default(), &toml).is_err());

        // the week-long upper bound itself is accepted
        let toml = TomlConfig {
            reset_token_ttl_minutes: Some(MAX_RESET_TTL_MINUTES),
            ..Default::default()
        };
        let config = ServerConfig::resolve(&ConfigOverrides::default(), &toml).unwrap();
        assert_eq!(config.reset_token_ttl_minutes, MAX_RESET_TTL_MINUTES);
    }
}
