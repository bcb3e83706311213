// ── Reactive stats queries ──
//
// A `StatsQuery` owns one data source and publishes `{data, loading,
// error}` through a `watch` channel. Every issued request carries a
// sequence number; a completion applies only while its number is still the
// latest, so a slow superseded response can never overwrite a newer one.
// Superseded requests are not cancelled on the wire.

mod sources;

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::filter::{Clock, FilterSnapshot, QueryDescriptor};

pub use sources::{
    DEFAULT_LEADERBOARD_LIMIT, DEFAULT_RECENT_LIMIT, FilterOptionsQuery, LeaderboardQuery,
    Overview, PlayTrend, RecentActivity,
};

/// Something that can answer a [`QueryDescriptor`].
pub trait StatsSource: Send + Sync + 'static {
    type Output: Send + Sync + 'static;

    /// Short name for logs.
    fn name(&self) -> &'static str;

    fn fetch(
        &self,
        descriptor: &QueryDescriptor,
    ) -> impl Future<Output = Result<Self::Output, CoreError>> + Send;
}

// ── Published state ──────────────────────────────────────────────────

/// Observable query state.
///
/// `data` survives failures and in-flight refetches; it is `None` only
/// until the first success.
#[derive(Debug)]
pub struct QueryState<T> {
    pub data: Option<Arc<T>>,
    pub loading: bool,
    pub error: Option<CoreError>,
    /// Descriptor of the latest issued request.
    pub descriptor: Option<QueryDescriptor>,
    /// When `data` was last replaced.
    pub updated_at: Option<DateTime<Utc>>,
    issued: u64,
}

impl<T> QueryState<T> {
    /// Sequence number of the latest issued request (0 before the first).
    pub fn issued(&self) -> u64 {
        self.issued
    }

    /// Whether at least one request has completed since the latest issue.
    pub fn is_settled(&self) -> bool {
        self.issued > 0 && !self.loading
    }

    /// Mark a new request in flight and return its sequence number.
    pub fn begin(&mut self, descriptor: QueryDescriptor) -> u64 {
        self.issued += 1;
        self.loading = true;
        self.descriptor = Some(descriptor);
        self.issued
    }

    /// Apply the outcome of request `seq`. Returns false, leaving the state
    /// untouched, when a newer request has been issued since.
    pub fn apply(&mut self, seq: u64, result: Result<T, CoreError>) -> bool {
        if seq != self.issued {
            return false;
        }
        self.loading = false;
        match result {
            Ok(data) => {
                self.data = Some(Arc::new(data));
                self.error = None;
                self.updated_at = Some(Utc::now());
            }
            Err(e) => self.error = Some(e),
        }
        true
    }
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            descriptor: None,
            updated_at: None,
            issued: 0,
        }
    }
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            loading: self.loading,
            error: self.error.clone(),
            descriptor: self.descriptor.clone(),
            updated_at: self.updated_at,
            issued: self.issued,
        }
    }
}

// ── Query ────────────────────────────────────────────────────────────

/// One data source bound to a published [`QueryState`].
pub struct StatsQuery<S: StatsSource> {
    source: Arc<S>,
    state: Arc<watch::Sender<QueryState<S::Output>>>,
    last: Option<(QueryDescriptor, u64)>,
}

impl<S: StatsSource> StatsQuery<S> {
    pub fn new(source: S) -> Self {
        let (state, _) = watch::channel(QueryState::default());
        Self {
            source: Arc::new(source),
            state: Arc::new(state),
            last: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn handle(&self) -> QueryHandle<S::Output> {
        QueryHandle {
            state: self.state.subscribe(),
        }
    }

    pub fn state(&self) -> QueryState<S::Output> {
        self.state.borrow().clone()
    }

    /// Issue a request unless `(descriptor, refresh_key)` equals the last
    /// one issued. Returns the completion task, which yields whether the
    /// result was applied.
    pub fn update(
        &mut self,
        descriptor: QueryDescriptor,
        refresh_key: u64,
    ) -> Option<JoinHandle<bool>> {
        if self
            .last
            .as_ref()
            .is_some_and(|(d, k)| *d == descriptor && *k == refresh_key)
        {
            return None;
        }
        let task = self.issue(descriptor.clone());
        self.last = Some((descriptor, refresh_key));
        Some(task)
    }

    /// Re-issue the last descriptor unconditionally.
    pub fn refetch(&mut self) -> Option<JoinHandle<bool>> {
        let descriptor = self.last.as_ref()?.0.clone();
        Some(self.issue(descriptor))
    }

    /// Follow filter and refresh changes until cancelled or until either
    /// sender is dropped.
    pub async fn drive(
        mut self,
        mut filter: watch::Receiver<Arc<FilterSnapshot>>,
        mut refresh: watch::Receiver<u64>,
        clock: Clock,
        cancel: CancellationToken,
    ) {
        debug!(source = self.source.name(), "query driver started");
        loop {
            let descriptor = filter.borrow_and_update().descriptor(clock());
            let refresh_key = *refresh.borrow_and_update();
            self.update(descriptor, refresh_key);

            tokio::select! {
                biased;

                () = cancel.cancelled() => break,

                changed = filter.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = refresh.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        debug!(source = self.source.name(), "query driver stopped");
    }

    fn issue(&self, descriptor: QueryDescriptor) -> JoinHandle<bool> {
        let mut seq = 0;
        self.state
            .send_modify(|state| seq = state.begin(descriptor.clone()));

        let name = self.source.name();
        debug!(source = name, seq, "query issued");

        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let result = source.fetch(&descriptor).await;
            if let Err(ref e) = result {
                warn!(source = name, seq, error = %e, "query failed");
            }
            let applied = state.send_if_modified(|current| current.apply(seq, result));
            if !applied {
                debug!(source = name, seq, "stale response discarded");
            }
            applied
        })
    }
}

// ── Handle ───────────────────────────────────────────────────────────

/// Read side of a spawned query.
#[derive(Debug)]
pub struct QueryHandle<T> {
    state: watch::Receiver<QueryState<T>>,
}

impl<T> Clone for QueryHandle<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> QueryHandle<T> {
    pub fn state(&self) -> QueryState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.state.clone()
    }

    /// Wait until the latest issued request has completed. `None` when the
    /// query was dropped first.
    pub async fn settled(&self) -> Option<QueryState<T>> {
        let mut rx = self.state.clone();
        let state = rx.wait_for(QueryState::is_settled).await.ok()?;
        Some(state.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn descriptor(day: u32) -> QueryDescriptor {
        let d = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        QueryDescriptor {
            start_date: d,
            end_date: d,
            clients: vec![],
            devices: vec![],
            users: vec![],
        }
    }

    fn fetch_error() -> CoreError {
        CoreError::Fetch {
            message: "HTTP 500: boom".into(),
            status: Some(500),
        }
    }

    #[test]
    fn first_fetch_has_no_data() {
        let mut state: QueryState<u32> = QueryState::default();
        state.begin(descriptor(1));
        assert!(state.loading);
        assert!(state.data.is_none());
    }

    #[test]
    fn loading_keeps_previous_data() {
        let mut state = QueryState::default();
        let a = state.begin(descriptor(1));
        state.apply(a, Ok(10));
        state.begin(descriptor(2));

        assert!(state.loading);
        assert_eq!(state.data.as_deref(), Some(&10));
    }

    #[test]
    fn late_response_is_ignored() {
        let mut state = QueryState::default();
        let a = state.begin(descriptor(1));
        let b = state.begin(descriptor(2));

        assert!(state.apply(b, Ok("B")));
        assert!(!state.apply(a, Ok("A")));
        assert_eq!(state.data.as_deref(), Some(&"B"));
        assert!(!state.loading);
    }

    #[test]
    fn stale_failure_is_ignored_too() {
        let mut state = QueryState::default();
        let a = state.begin(descriptor(1));
        let b = state.begin(descriptor(2));

        assert!(state.apply(b, Ok(2)));
        assert!(!state.apply(a, Err(fetch_error())));
        assert!(state.error.is_none());
    }

    #[test]
    fn failure_keeps_data_and_success_clears_error() {
        let mut state = QueryState::default();
        let a = state.begin(descriptor(1));
        state.apply(a, Ok(1));

        let b = state.begin(descriptor(2));
        state.apply(b, Err(fetch_error()));
        assert_eq!(state.data.as_deref(), Some(&1));
        assert_eq!(state.error, Some(fetch_error()));
        assert!(!state.loading);

        let c = state.begin(descriptor(3));
        state.apply(c, Ok(3));
        assert_eq!(state.data.as_deref(), Some(&3));
        assert!(state.error.is_none());
    }
}
