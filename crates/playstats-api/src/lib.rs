// playstats-api: Async Rust client for the playback statistics backend

pub mod client;
pub mod error;
pub mod models;
pub mod params;
pub mod transport;

mod endpoints;

pub use client::StatsClient;
pub use error::Error;
pub use models::{
    AuthStatus, FilterOptions, LeaderboardEntry, OverviewStats, RecentItem, TrendPoint, UserOption,
};
pub use params::{Leaderboard, StatsParams};
pub use transport::TransportConfig;
