//! CLI configuration: thin wrapper around `playstats_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides (--server,
//! --session-token, --timeout).

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use playstats_core::{DashboardSession, KeyValueStore, StatsClient, TransportConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use playstats_config::{
    Config, ConfigError, FileStore, Profile, config_path, load_config, load_config_or_default,
    parse_server_url, save_config,
};

/// `ProfileNotFound` listing the profiles that do exist.
pub fn profile_not_found(name: String, config: &Config) -> CliError {
    let mut available: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
    available.sort_unstable();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
        path: config_path().display().to_string(),
    }
}

/// Build a `StatsClient` from the config file, profile, and CLI overrides.
///
/// CLI flags take priority over profile values.
pub fn build_client(global: &GlobalOpts, config: &Config) -> Result<StatsClient, CliError> {
    let (profile_name, url, mut transport) = match config.profile(global.profile.as_deref()) {
        Ok((name, profile)) => {
            let (url, transport) =
                playstats_config::profile_to_transport(profile, &config.defaults)?;
            let url = match global.server.as_deref() {
                Some(server) => parse_server_url(server)?,
                None => url,
            };
            (name.to_owned(), url, transport)
        }
        // An explicitly requested profile must exist
        Err(ConfigError::ProfileNotFound { name }) if global.profile.is_some() => {
            return Err(profile_not_found(name, config));
        }
        Err(err) => {
            // No profile -- build from CLI flags / env vars alone
            tracing::debug!(error = %err, "no usable profile, falling back to flags");
            let server = global.server.as_deref().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            let transport = TransportConfig {
                timeout: Duration::from_secs(config.defaults.timeout),
                session_token: None,
            };
            ("(flags)".to_owned(), parse_server_url(server)?, transport)
        }
    };

    if let Some(ref token) = global.session_token {
        transport.session_token = Some(SecretString::from(token.clone()));
    }
    if let Some(seconds) = global.timeout {
        transport.timeout = Duration::from_secs(seconds);
    }

    tracing::debug!(server = %url, profile = %profile_name, "resolved backend");
    StatsClient::new(url, &transport).map_err(|e| playstats_core::CoreError::from(e).into())
}

/// Open the durable preference store and start a session over it.
pub fn open_session() -> Result<DashboardSession, CliError> {
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open_default()?);
    Ok(DashboardSession::new(store))
}
