//! Configuration for the SafeWatch dashboard.
//!
//! TOML profiles, credential resolution (keyring + env + plaintext),
//! and translation to `safewatch_core::EngineConfig`. The TUI binary
//! depends on this crate; core never reads config files itself.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use safewatch_core::{EngineConfig, Role};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no bearer credential configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("unknown profile '{0}'")]
    UnknownProfile(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name, falling back to the default profile.
    pub fn profile<'a>(
        &'a self,
        name: Option<&'a str>,
    ) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        let profile = self
            .profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.into()))?;
        Ok((name, profile))
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Delay before the first channel reconnect attempt, seconds.
    #[serde(default = "default_reconnect_initial")]
    pub reconnect_initial_secs: u64,

    /// Upper bound on reconnect backoff, seconds.
    #[serde(default = "default_reconnect_max")]
    pub reconnect_max_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            reconnect_initial_secs: default_reconnect_initial(),
            reconnect_max_secs: default_reconnect_max(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_reconnect_initial() -> u64 {
    1
}
fn default_reconnect_max() -> u64 {
    30
}

/// A named backend profile.
#[derive(Debug, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g., "https://safewatch.example").
    pub backend: String,

    /// Event channel URL override. Derived from `backend` when absent.
    pub ws_url: Option<String>,

    /// Operator identity used as the default dispatch assignee.
    pub operator_id: String,

    /// Role: "viewer", "operator", "dispatcher", or "admin".
    #[serde(default = "default_role")]
    pub role: String,

    /// Bearer token (plaintext — prefer keyring or env var).
    pub bearer: Option<String>,

    /// Environment variable name containing the bearer token.
    pub bearer_env: Option<String>,

    /// Whether the backend requires a bearer credential at all.
    #[serde(default)]
    pub anonymous: bool,

    /// Override request timeout, seconds.
    pub timeout: Option<u64>,
}

fn default_role() -> String {
    "viewer".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "safewatch", "safewatch").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("safewatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from an explicit path + environment (tests and the
/// `--config` flag).
pub fn load_config_from(path: &std::path::Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SAFEWATCH_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the bearer token from the credential chain.
///
/// Order: profile's `bearer_env` env var, then the system keyring,
/// then plaintext in the profile. `anonymous` profiles skip the chain
/// entirely.
pub fn resolve_bearer(
    profile: &Profile,
    profile_name: &str,
) -> Result<Option<SecretString>, ConfigError> {
    if profile.anonymous {
        return Ok(None);
    }

    // 1. Profile's bearer_env → env var lookup
    if let Some(ref env_name) = profile.bearer_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(Some(SecretString::from(val)));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new("safewatch", &format!("{profile_name}/bearer")) {
        if let Ok(secret) = entry.get_password() {
            return Ok(Some(SecretString::from(secret)));
        }
    }

    // 3. Plaintext in config
    if let Some(ref token) = profile.bearer {
        return Ok(Some(SecretString::from(token.clone())));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

// ── Translation to the runtime config ───────────────────────────────

/// Build an `EngineConfig` from a profile.
pub fn profile_to_engine_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<EngineConfig, ConfigError> {
    let base_url: url::Url = profile
        .backend
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "backend".into(),
            reason: format!("invalid URL: {}", profile.backend),
        })?;

    let ws_url = match profile.ws_url {
        Some(ref raw) => raw.parse().map_err(|_| ConfigError::Validation {
            field: "ws_url".into(),
            reason: format!("invalid URL: {raw}"),
        })?,
        None => {
            EngineConfig::ws_url_for(&base_url).map_err(|e| ConfigError::Validation {
                field: "backend".into(),
                reason: format!("cannot derive channel URL: {e}"),
            })?
        }
    };

    let role: Role = profile
        .role
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "role".into(),
            reason: format!(
                "expected 'viewer', 'operator', 'dispatcher', or 'admin', got '{}'",
                profile.role
            ),
        })?;

    let bearer = resolve_bearer(profile, profile_name)?;

    Ok(EngineConfig {
        base_url,
        ws_url,
        bearer,
        operator_id: profile.operator_id.clone(),
        role,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        reconnect_initial_delay: Duration::from_secs(defaults.reconnect_initial_secs),
        reconnect_max_delay: Duration::from_secs(defaults.reconnect_max_secs),
        reconnect_max_retries: None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn profile(role: &str) -> Profile {
        Profile {
            backend: "https://safewatch.example".into(),
            ws_url: None,
            operator_id: "off_001".into(),
            role: role.into(),
            bearer: Some("token-123".into()),
            bearer_env: None,
            anonymous: false,
            timeout: None,
        }
    }

    #[test]
    fn profile_translates_to_engine_config() {
        let cfg = profile_to_engine_config(&profile("dispatcher"), "default", &Defaults::default())
            .unwrap();

        assert_eq!(cfg.role, Role::Dispatcher);
        assert_eq!(cfg.operator_id, "off_001");
        assert_eq!(cfg.ws_url.as_str(), "wss://safewatch.example/ws/events");
        assert!(cfg.bearer.is_some());
        assert_eq!(cfg.timeout, Duration::from_secs(30));
    }

    #[test]
    fn bad_role_is_a_validation_error() {
        let err = profile_to_engine_config(&profile("supervisor"), "default", &Defaults::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn anonymous_profile_skips_the_credential_chain() {
        let mut p = profile("viewer");
        p.anonymous = true;
        p.bearer = None;

        let bearer = resolve_bearer(&p, "default").unwrap();
        assert!(bearer.is_none());
    }

    #[test]
    fn missing_credentials_surface_the_profile_name() {
        let mut p = profile("viewer");
        p.bearer = None;

        let err = resolve_bearer(&p, "field-ops").unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { profile } if profile == "field-ops"));
    }

    #[test]
    fn explicit_ws_url_wins_over_derivation() {
        let mut p = profile("admin");
        p.ws_url = Some("wss://events.safewatch.example/v2".into());

        let cfg = profile_to_engine_config(&p, "default", &Defaults::default()).unwrap();
        assert_eq!(cfg.ws_url.as_str(), "wss://events.safewatch.example/v2");
    }

    #[test]
    fn config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "hq"

[profiles.hq]
backend = "https://safewatch.example"
operator_id = "off_007"
role = "admin"
anonymous = true
"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        let (name, profile) = config.profile(None).unwrap();
        assert_eq!(name, "hq");
        assert_eq!(profile.role, "admin");
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let config = Config::default();
        assert!(matches!(
            config.profile(Some("ghost")),
            Err(ConfigError::UnknownProfile(_))
        ));
    }
}
