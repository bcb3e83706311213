// ── Dashboard session ──
//
// Owns every piece of shared dashboard state for one user session and
// spawns the query drivers that react to it.

use std::sync::Arc;

use chrono::NaiveDate;
use playstats_api::FilterOptions;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::filter::{Clock, FilterState, QueryDescriptor, local_today};
use crate::names::NameMappingRegistry;
use crate::nav::TabNavigation;
use crate::persist::KeyValueStore;
use crate::preferences::Preferences;
use crate::query::{QueryHandle, StatsQuery, StatsSource};

/// Filter state, name mappings, preferences and navigation for one session.
///
/// Spawned queries stop on [`shutdown`](Self::shutdown) or when the session
/// is dropped.
pub struct DashboardSession {
    filter: FilterState,
    names: NameMappingRegistry,
    preferences: Preferences,
    nav: TabNavigation,
    clock: Clock,
    cancel: CancellationToken,
}

impl DashboardSession {
    /// Load preferences and name mappings from `store` and seed the filter
    /// with the preferred window.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(store, local_today)
    }

    /// Like [`new`](Self::new) with a custom source of "today".
    pub fn with_clock(store: Arc<dyn KeyValueStore>, clock: Clock) -> Self {
        let preferences = Preferences::load(Arc::clone(&store));
        let names = NameMappingRegistry::load(store);
        let filter = FilterState::with_clock(preferences.default_days(), clock);

        info!(
            theme = %preferences.theme(),
            default_days = preferences.default_days(),
            "dashboard session started"
        );

        Self {
            filter,
            names,
            preferences,
            nav: TabNavigation::new(),
            clock,
            cancel: CancellationToken::new(),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn names(&self) -> &NameMappingRegistry {
        &self.names
    }

    pub fn names_mut(&mut self) -> &mut NameMappingRegistry {
        &mut self.names
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn preferences_mut(&mut self) -> &mut Preferences {
        &mut self.preferences
    }

    pub fn nav(&self) -> &TabNavigation {
        &self.nav
    }

    pub fn nav_mut(&mut self) -> &mut TabNavigation {
        &mut self.nav
    }

    pub fn today(&self) -> NaiveDate {
        self.filter.today()
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Switch to a trailing window and remember it as the default.
    pub fn select_days(&mut self, days: u32) -> Result<(), CoreError> {
        self.filter.set_days(days)?;
        self.preferences.set_default_days(days)?;
        self.filter.set_default_days(days)
    }

    /// The current filter resolved as of today.
    pub fn descriptor(&self) -> QueryDescriptor {
        self.filter.descriptor()
    }

    /// Start a query that follows filter and refresh changes.
    ///
    /// Must be called from within a tokio runtime. The first request is
    /// issued immediately.
    pub fn spawn_query<S: StatsSource>(&self, source: S) -> QueryHandle<S::Output> {
        let query = StatsQuery::new(source);
        let handle = query.handle();
        debug!(source = query.source().name(), "spawning query driver");
        tokio::spawn(query.drive(
            self.filter.subscribe(),
            self.nav.subscribe_refresh(),
            self.clock,
            self.cancel.child_token(),
        ));
        handle
    }

    /// Record backend-reported filter options for the naming panels.
    pub fn apply_filter_options(&mut self, options: &FilterOptions) {
        self.names.set_available(options);
    }

    /// Re-issue every spawned query.
    pub fn refresh(&self) -> u64 {
        self.nav.refresh()
    }

    /// Stop every spawned query driver. In-flight requests still land.
    pub fn shutdown(&self) {
        if !self.cancel.is_cancelled() {
            debug!("dashboard session shutting down");
            self.cancel.cancel();
        }
    }
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for DashboardSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardSession")
            .field("filter", &self.filter.snapshot())
            .field("names", &self.names)
            .field("preferences", &self.preferences)
            .field("nav", &self.nav)
            .finish_non_exhaustive()
    }
}
