// Concrete stats sources over the backend client.

use playstats_api::{
    FilterOptions, Leaderboard, LeaderboardEntry, OverviewStats, RecentItem, StatsClient,
    TrendPoint,
};

use super::StatsSource;
use crate::error::CoreError;
use crate::filter::QueryDescriptor;

/// Items shown by the history view.
pub const DEFAULT_RECENT_LIMIT: u32 = 48;

/// Rows per leaderboard.
pub const DEFAULT_LEADERBOARD_LIMIT: u32 = 10;

/// Recently played items.
#[derive(Debug, Clone)]
pub struct RecentActivity {
    client: StatsClient,
    limit: u32,
}

impl RecentActivity {
    pub fn new(client: StatsClient) -> Self {
        Self::with_limit(client, DEFAULT_RECENT_LIMIT)
    }

    pub fn with_limit(client: StatsClient, limit: u32) -> Self {
        Self { client, limit }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

impl StatsSource for RecentActivity {
    type Output = Vec<RecentItem>;

    fn name(&self) -> &'static str {
        "recent"
    }

    async fn fetch(&self, descriptor: &QueryDescriptor) -> Result<Self::Output, CoreError> {
        Ok(self
            .client
            .recent(&descriptor.to_params(), self.limit)
            .await?)
    }
}

/// Window totals.
#[derive(Debug, Clone)]
pub struct Overview {
    client: StatsClient,
}

impl Overview {
    pub fn new(client: StatsClient) -> Self {
        Self { client }
    }
}

impl StatsSource for Overview {
    type Output = OverviewStats;

    fn name(&self) -> &'static str {
        "overview"
    }

    async fn fetch(&self, descriptor: &QueryDescriptor) -> Result<Self::Output, CoreError> {
        Ok(self.client.overview(&descriptor.to_params()).await?)
    }
}

/// One ranked breakdown.
#[derive(Debug, Clone)]
pub struct LeaderboardQuery {
    client: StatsClient,
    board: Leaderboard,
    limit: u32,
}

impl LeaderboardQuery {
    pub fn new(client: StatsClient, board: Leaderboard) -> Self {
        Self::with_limit(client, board, DEFAULT_LEADERBOARD_LIMIT)
    }

    pub fn with_limit(client: StatsClient, board: Leaderboard, limit: u32) -> Self {
        Self {
            client,
            board,
            limit,
        }
    }

    pub fn board(&self) -> Leaderboard {
        self.board
    }
}

impl StatsSource for LeaderboardQuery {
    type Output = Vec<LeaderboardEntry>;

    fn name(&self) -> &'static str {
        match self.board {
            Leaderboard::Content => "top-content",
            Leaderboard::Users => "top-users",
            Leaderboard::Clients => "clients",
            Leaderboard::Devices => "devices",
        }
    }

    async fn fetch(&self, descriptor: &QueryDescriptor) -> Result<Self::Output, CoreError> {
        Ok(self
            .client
            .leaderboard(self.board, &descriptor.to_params(), self.limit)
            .await?)
    }
}

/// Daily play counts.
#[derive(Debug, Clone)]
pub struct PlayTrend {
    client: StatsClient,
}

impl PlayTrend {
    pub fn new(client: StatsClient) -> Self {
        Self { client }
    }
}

impl StatsSource for PlayTrend {
    type Output = Vec<TrendPoint>;

    fn name(&self) -> &'static str {
        "trend"
    }

    async fn fetch(&self, descriptor: &QueryDescriptor) -> Result<Self::Output, CoreError> {
        Ok(self.client.trend(&descriptor.to_params()).await?)
    }
}

/// Filter and naming options. Ignores the descriptor's contents; it still
/// re-fetches on refresh.
#[derive(Debug, Clone)]
pub struct FilterOptionsQuery {
    client: StatsClient,
}

impl FilterOptionsQuery {
    pub fn new(client: StatsClient) -> Self {
        Self { client }
    }
}

impl StatsSource for FilterOptionsQuery {
    type Output = FilterOptions;

    fn name(&self) -> &'static str {
        "filter-options"
    }

    async fn fetch(&self, _descriptor: &QueryDescriptor) -> Result<Self::Output, CoreError> {
        Ok(self.client.filter_options().await?)
    }
}
