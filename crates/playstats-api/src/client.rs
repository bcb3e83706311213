// Statistics backend HTTP client
//
// Wraps `reqwest::Client` with URL construction, query encoding and
// response classification. Endpoint methods live in `endpoints.rs` as
// inherent methods so this module stays focused on transport mechanics.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// How much of an error body is kept in error messages.
const BODY_PREVIEW_CHARS: usize = 200;

/// Raw HTTP client for the statistics backend.
///
/// Cheap to clone: the inner `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct StatsClient {
    http: reqwest::Client,
    base_url: Url,
}

impl StatsClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the server root (e.g. `http://nas:8000`); a path
    /// prefix such as `http://host/stats` is kept for reverse-proxy setups.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { http, base_url }
    }

    /// The server root every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Resolve an endpoint path such as `api/overview`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request with query pairs and decode the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.api_url(path)?;
        debug!(%url, params = query.len(), "GET");

        let resp = self.http.get(url).query(query).send().await?;
        Self::parse_response(resp).await
    }

    /// Classify the status, then decode the body.
    async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized);
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                message: preview(&body),
            });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}
