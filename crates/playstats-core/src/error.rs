// ── Core error types ──
//
// User-facing errors from playstats-core. Consumers never see raw HTTP
// or JSON failures: the `From<playstats_api::Error>` impl translates
// transport-layer errors into fetch-level variants.
//
// `Clone` because fetch errors are stored inside published query state.

use chrono::NaiveDate;
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    // ── Validation errors ────────────────────────────────────────────
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid window: {days} days (must be at least 1)")]
    InvalidDays { days: u32 },

    // ── Fetch errors ─────────────────────────────────────────────────
    #[error("Not logged in to the statistics backend")]
    Unauthorized,

    #[error("Cannot reach statistics backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Statistics request timed out")]
    Timeout,

    #[error("Fetch failed: {message}")]
    Fetch {
        message: String,
        /// HTTP status code (if the backend answered).
        status: Option<u16>,
    },

    #[error("Unexpected response from backend: {message}")]
    InvalidResponse { message: String },

    // ── Persistence errors ───────────────────────────────────────────
    #[error("Failed to read preference '{key}': {reason}")]
    PersistenceRead { key: String, reason: String },

    #[error("Failed to save preference '{key}': {reason}")]
    PersistenceWrite { key: String, reason: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Whether this error came from a stats request (as opposed to
    /// validation or storage).
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized
                | Self::ConnectionFailed { .. }
                | Self::Timeout
                | Self::Fetch { .. }
                | Self::InvalidResponse { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<playstats_api::Error> for CoreError {
    fn from(err: playstats_api::Error) -> Self {
        let status = err.status();
        match err {
            playstats_api::Error::Unauthorized => CoreError::Unauthorized,
            playstats_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Fetch {
                        message: e.to_string(),
                        status,
                    }
                }
            }
            playstats_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            playstats_api::Error::ClientBuild(message) => CoreError::Config { message },
            playstats_api::Error::Status { status, message } => CoreError::Fetch {
                message: format!("HTTP {status}: {message}"),
                status: Some(status),
            },
            playstats_api::Error::Deserialization { message, body: _ } => {
                CoreError::InvalidResponse { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_keep_code() {
        let err = CoreError::from(playstats_api::Error::Status {
            status: 502,
            message: "bad gateway".into(),
        });
        assert_eq!(
            err,
            CoreError::Fetch {
                message: "HTTP 502: bad gateway".into(),
                status: Some(502),
            }
        );
        assert!(err.is_fetch());
    }

    #[test]
    fn unauthorized_maps_through() {
        let err = CoreError::from(playstats_api::Error::Unauthorized);
        assert_eq!(err, CoreError::Unauthorized);
    }

    #[test]
    fn validation_is_not_fetch() {
        assert!(!CoreError::InvalidDays { days: 0 }.is_fetch());
    }
}
