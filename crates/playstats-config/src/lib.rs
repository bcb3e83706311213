//! Shared configuration for the playstats CLI.
//!
//! TOML profiles, session token resolution (env + plaintext), translation
//! to a `TransportConfig`, and the file-backed preference store. The CLI
//! adds `GlobalOpts`-aware wrappers on top.

mod store;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use playstats_core::{DEFAULT_RECENT_LIMIT, TransportConfig};

pub use store::FileStore;

/// Overrides the config directory (tests, portable installs).
pub const CONFIG_DIR_ENV: &str = "PLAYSTATS_CONFIG_DIR";

/// Overrides the data directory holding `state.toml`.
pub const DATA_DIR_ENV: &str = "PLAYSTATS_DATA_DIR";

/// Session token fallback when the profile names no variable.
pub const SESSION_TOKEN_ENV: &str = "PLAYSTATS_SESSION_TOKEN";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

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
#[derive(Debug, Clone, Deserialize, Serialize)]
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
    /// The profile to use: explicit name, then `default_profile`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, p)| (k.as_str(), p))
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Items listed by `recent` when `--limit` is not given.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            recent_limit: default_recent_limit(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_recent_limit() -> u32 {
    DEFAULT_RECENT_LIMIT
}

/// A named backend profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g., "http://localhost:8000").
    pub server: String,

    /// Session cookie value in plaintext. Prefer `session_token_env`.
    pub session_token: Option<String>,

    /// Environment variable name containing the session token.
    pub session_token_env: Option<String>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "playstats", "playstats")
}

/// Resolve the config directory via override env var or XDG / platform
/// conventions.
pub fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return PathBuf::from(dir);
    }
    project_dirs().map_or_else(
        || home_fallback(".config"),
        |dirs| dirs.config_dir().to_path_buf(),
    )
}

/// Resolve the config file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Resolve the data directory (durable preferences).
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    project_dirs().map_or_else(
        || home_fallback(".local/share"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

/// Path of the durable preference store.
pub fn state_path() -> PathBuf {
    data_dir().join("state.toml")
}

fn home_fallback(sub: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(sub);
    p.push("playstats");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from a specific file + environment. A missing file yields the
/// defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PLAYSTATS_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist or is broken.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Session token resolution ────────────────────────────────────────

/// Resolve the session token (no CLI flag step).
///
/// Order: the profile's `session_token_env` variable (or
/// `PLAYSTATS_SESSION_TOKEN`), then plaintext. `None` means an anonymous
/// session.
pub fn resolve_session_token(profile: &Profile) -> Option<SecretString> {
    let env_name = profile
        .session_token_env
        .as_deref()
        .unwrap_or(SESSION_TOKEN_ENV);
    if let Ok(val) = std::env::var(env_name) {
        if !val.is_empty() {
            return Some(SecretString::from(val));
        }
    }

    profile
        .session_token
        .as_ref()
        .filter(|t| !t.is_empty())
        .map(|t| SecretString::from(t.clone()))
}

/// Parse a backend URL, requiring http or https.
pub fn parse_server_url(raw: &str) -> Result<Url, ConfigError> {
    let url: Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "server".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "server".into(),
            reason: format!("expected http or https, got '{}'", url.scheme()),
        });
    }
    Ok(url)
}

/// Build the backend URL and transport settings from a profile, without
/// CLI flag overrides.
pub fn profile_to_transport(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<(Url, TransportConfig), ConfigError> {
    let url = parse_server_url(&profile.server)?;
    let transport = TransportConfig {
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        session_token: resolve_session_token(profile),
    };
    Ok((url, transport))
}
