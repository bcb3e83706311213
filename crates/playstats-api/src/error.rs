use thiserror::Error;

/// Top-level error type for the `playstats-api` crate.
///
/// Covers every failure mode of a statistics request: transport,
/// HTTP status, and response decoding. `playstats-core` maps these into
/// user-facing fetch errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The backend rejected the session (missing or expired login).
    #[error("Not logged in -- the backend answered HTTP 401")]
    Unauthorized,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Building the HTTP client failed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Backend ─────────────────────────────────────────────────────
    /// Non-success status from a statistics endpoint.
    #[error("Backend error (HTTP {status}): {message}")]
    Status { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// HTTP status code, when the backend produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
