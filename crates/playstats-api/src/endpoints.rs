// Statistics endpoints
//
// Every stats endpoint takes the shared window/dimension parameters;
// list endpoints also take a `limit`.

use serde_json::Value;
use tracing::debug;

use crate::client::StatsClient;
use crate::error::Error;
use crate::models::{
    AuthStatus, FilterOptions, LeaderboardEntry, OverviewStats, RecentItem, RecentResponse,
    TrendPoint, TrendResponse,
};
use crate::params::{Leaderboard, StatsParams};

fn with_limit(params: &StatsParams, limit: u32) -> Vec<(&'static str, String)> {
    let mut query = params.query_pairs();
    query.push(("limit", limit.to_string()));
    query
}

impl StatsClient {
    /// Totals for the window.
    ///
    /// `GET /api/overview`
    pub async fn overview(&self, params: &StatsParams) -> Result<OverviewStats, Error> {
        self.get_json("api/overview", &params.query_pairs()).await
    }

    /// Per-day plays and hours.
    ///
    /// `GET /api/trend`
    pub async fn trend(&self, params: &StatsParams) -> Result<Vec<TrendPoint>, Error> {
        let resp: TrendResponse = self.get_json("api/trend", &params.query_pairs()).await?;
        Ok(resp.trend)
    }

    /// Most recent plays, newest first.
    ///
    /// `GET /api/recent?limit=N`
    pub async fn recent(&self, params: &StatsParams, limit: u32) -> Result<Vec<RecentItem>, Error> {
        let resp: RecentResponse = self.get_json("api/recent", &with_limit(params, limit)).await?;
        Ok(resp.recent)
    }

    /// A ranked breakdown.
    ///
    /// The entries live under a board-specific key (`top_content`,
    /// `top_users`, `clients`, `devices`). A missing key is an empty board.
    pub async fn leaderboard(
        &self,
        board: Leaderboard,
        params: &StatsParams,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, Error> {
        debug!(%board, limit, "fetching leaderboard");
        let mut resp: Value = self.get_json(board.path(), &with_limit(params, limit)).await?;

        let entries = resp
            .get_mut(board.response_key())
            .map_or(Value::Null, Value::take);
        if entries.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(entries).map_err(|e| Error::Deserialization {
            message: format!("{board} leaderboard: {e}"),
            body: resp.to_string(),
        })
    }

    /// Client, device and user values known to the backend.
    ///
    /// `GET /api/filter-options`
    pub async fn filter_options(&self) -> Result<FilterOptions, Error> {
        self.get_json("api/filter-options", &[]).await
    }

    /// Current login state.
    ///
    /// `GET /api/auth/check`. A 401 is reported as "not authenticated"
    /// rather than as an error.
    pub async fn auth_status(&self) -> Result<AuthStatus, Error> {
        match self.get_json("api/auth/check", &[]).await {
            Err(Error::Unauthorized) => Ok(AuthStatus::default()),
            other => other,
        }
    }
}
