// Transport configuration for building the reqwest::Client.
//
// Timeout, user agent and the session cookie live here so the endpoint
// code only deals with URLs and payloads.

use std::time::Duration;

use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Name of the cookie carrying the backend login session.
pub const SESSION_COOKIE: &str = "session";

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    /// Login session issued by the backend. Sent as a cookie when present.
    pub session_token: Option<SecretString>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            session_token: None,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();
        if let Some(ref token) = self.session_token {
            let cookie = format!("{SESSION_COOKIE}={}", token.expose_secret());
            let mut value = HeaderValue::from_str(&cookie)
                .map_err(|e| Error::ClientBuild(format!("invalid session token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(COOKIE, value);
        }

        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("playstats/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))
    }

    /// Attach a session token.
    pub fn with_session(mut self, token: SecretString) -> Self {
        self.session_token = Some(token);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_without_session() {
        assert!(TransportConfig::default().build_client().is_ok());
    }

    #[test]
    fn rejects_token_with_control_characters() {
        let cfg = TransportConfig::default().with_session(SecretString::from("bad\ntoken".to_string()));
        assert!(matches!(cfg.build_client(), Err(Error::ClientBuild(_))));
    }
}
