// playstats-core: Dashboard state between playstats-api and consumers (CLI).
//
// Filter state and its query descriptors, label overrides and preferences
// in durable storage, and last-request-wins stats queries that react to
// filter and refresh changes. Everything hangs off a `DashboardSession`.

pub mod error;
pub mod filter;
pub mod names;
pub mod nav;
pub mod persist;
pub mod preferences;
pub mod query;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use error::CoreError;
pub use filter::{
    Clock, DAY_PRESETS, DEFAULT_DAYS, DateRange, Dimension, FilterSnapshot, FilterState,
    QueryDescriptor, WindowMode, local_today,
};
pub use names::{MappingKind, NameMapping, NameMappingRegistry};
pub use nav::{Tab, TabNavigation};
pub use persist::{KeyValueStore, MemoryStore, StorageError};
pub use preferences::{Preferences, Theme};
pub use query::{
    DEFAULT_LEADERBOARD_LIMIT, DEFAULT_RECENT_LIMIT, FilterOptionsQuery, LeaderboardQuery,
    Overview, PlayTrend, QueryHandle, QueryState, RecentActivity, StatsQuery, StatsSource,
};
pub use session::DashboardSession;

// Re-exported so downstream crates need not depend on playstats-api directly.
pub use playstats_api::{
    AuthStatus, FilterOptions, Leaderboard, LeaderboardEntry, OverviewStats, RecentItem,
    StatsClient, TransportConfig, TrendPoint,
};
