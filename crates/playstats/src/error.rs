//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use playstats_config::ConfigError;
use playstats_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the statistics backend at {url}")]
    #[diagnostic(
        code(playstats::connection_failed),
        help(
            "Check that the backend is running and reachable.\n\
             URL: {url}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(playstats::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not logged in to the statistics backend")]
    #[diagnostic(
        code(playstats::unauthorized),
        help(
            "Pass a session token with --session-token, set PLAYSTATS_SESSION_TOKEN,\n\
             or configure session_token_env in your profile."
        )
    )]
    Unauthorized,

    // ── Backend ──────────────────────────────────────────────────────
    #[error("Backend error: {message}")]
    #[diagnostic(code(playstats::api_error))]
    ApiError {
        message: String,
        status: Option<u16>,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(playstats::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(playstats::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Add one to {path}"
        )
    )]
    ProfileNotFound {
        name: String,
        available: String,
        path: String,
    },

    #[error("No backend configured")]
    #[diagnostic(
        code(playstats::no_config),
        help(
            "Pass --server <URL> or add a profile to the config file.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(playstats::config))]
    Config(#[from] ConfigError),

    // ── Persistence ──────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(playstats::persistence),
        help("The change applies to this run only. Check permissions on {path}.")
    )]
    Persistence { message: String, path: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to encode output: {0}")]
    #[diagnostic(code(playstats::json))]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(playstats::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Unauthorized => exit_code::AUTH,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidRange { start, end } => CliError::Validation {
                field: "--from/--to".into(),
                reason: format!("start {start} is after end {end}"),
            },
            CoreError::InvalidDays { days } => CliError::Validation {
                field: "--days".into(),
                reason: format!("{days} (must be at least 1)"),
            },
            CoreError::Unauthorized => CliError::Unauthorized,
            CoreError::ConnectionFailed { url, reason } => {
                CliError::ConnectionFailed { url, reason }
            }
            CoreError::Timeout => CliError::Timeout,
            CoreError::Fetch { message, status } => CliError::ApiError { message, status },
            CoreError::InvalidResponse { message } => CliError::ApiError {
                message: format!("unexpected response: {message}"),
                status: None,
            },
            CoreError::PersistenceRead { .. } | CoreError::PersistenceWrite { .. } => {
                CliError::Persistence {
                    message: err.to_string(),
                    path: playstats_config::state_path().display().to_string(),
                }
            }
            CoreError::Config { message } => CliError::Validation {
                field: "server".into(),
                reason: message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn invalid_range_is_a_usage_error() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap_or_default();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
        let err = CliError::from(CoreError::InvalidRange { start, end });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn unauthorized_maps_to_auth_exit() {
        assert_eq!(
            CliError::from(CoreError::Unauthorized).exit_code(),
            exit_code::AUTH
        );
    }
}
