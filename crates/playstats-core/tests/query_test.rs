#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use playstats_core::{
    CoreError, DashboardSession, MemoryStore, QueryDescriptor, QueryState, StatsQuery,
    StatsSource,
};
use pretty_assertions::assert_eq;
use tokio::sync::oneshot;

type Reply = Result<String, CoreError>;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn descriptor(d: u32) -> QueryDescriptor {
    QueryDescriptor {
        start_date: day(d),
        end_date: day(d),
        clients: vec![],
        devices: vec![],
        users: vec![],
    }
}

fn server_error() -> CoreError {
    CoreError::Fetch {
        message: "HTTP 500: boom".into(),
        status: Some(500),
    }
}

// ── Test doubles ────────────────────────────────────────────────────

/// Answers each request once its start date has been released. Dates that
/// were never held answer immediately with the date itself.
#[derive(Default)]
struct Gate {
    held: Mutex<HashMap<NaiveDate, oneshot::Receiver<Reply>>>,
}

impl Gate {
    fn hold(&self, date: NaiveDate) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.held.lock().unwrap().insert(date, rx);
        tx
    }
}

struct Gated(Arc<Gate>);

impl StatsSource for Gated {
    type Output = String;

    fn name(&self) -> &'static str {
        "gated"
    }

    async fn fetch(&self, descriptor: &QueryDescriptor) -> Reply {
        let held = self.0.held.lock().unwrap().remove(&descriptor.start_date);
        match held {
            Some(rx) => rx.await.unwrap_or(Err(CoreError::Timeout)),
            None => Ok(descriptor.start_date.to_string()),
        }
    }
}

/// Echoes the descriptor it was asked for.
struct Echo;

impl StatsSource for Echo {
    type Output = QueryDescriptor;

    fn name(&self) -> &'static str {
        "echo"
    }

    async fn fetch(&self, descriptor: &QueryDescriptor) -> Result<QueryDescriptor, CoreError> {
        Ok(descriptor.clone())
    }
}

fn data(state: &QueryState<String>) -> Option<&str> {
    state.data.as_deref().map(String::as_str)
}

// ── Last request wins ───────────────────────────────────────────────

#[tokio::test]
async fn superseded_response_arriving_late_is_discarded() {
    let gate = Arc::new(Gate::default());
    let release_a = gate.hold(day(1));
    let release_b = gate.hold(day(2));

    let mut query = StatsQuery::new(Gated(Arc::clone(&gate)));
    let handle = query.handle();

    let task_a = query.update(descriptor(1), 0).unwrap();
    let task_b = query.update(descriptor(2), 0).unwrap();
    assert!(handle.state().loading);

    release_b.send(Ok("B".into())).unwrap();
    assert!(task_b.await.unwrap());

    release_a.send(Ok("A".into())).unwrap();
    assert!(!task_a.await.unwrap());

    let state = handle.state();
    assert_eq!(data(&state), Some("B"));
    assert!(!state.loading);
    assert_eq!(state.descriptor, Some(descriptor(2)));
}

#[tokio::test]
async fn superseded_response_arriving_first_does_not_clear_loading() {
    let gate = Arc::new(Gate::default());
    let release_a = gate.hold(day(1));
    let release_b = gate.hold(day(2));

    let mut query = StatsQuery::new(Gated(Arc::clone(&gate)));
    let handle = query.handle();

    let task_a = query.update(descriptor(1), 0).unwrap();
    let task_b = query.update(descriptor(2), 0).unwrap();

    release_a.send(Ok("A".into())).unwrap();
    assert!(!task_a.await.unwrap());
    assert!(handle.state().loading);
    assert!(handle.state().data.is_none());

    release_b.send(Ok("B".into())).unwrap();
    assert!(task_b.await.unwrap());
    assert_eq!(data(&handle.state()), Some("B"));
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn failure_keeps_data_until_next_success() {
    let gate = Arc::new(Gate::default());
    let mut query = StatsQuery::new(Gated(Arc::clone(&gate)));
    let handle = query.handle();

    assert!(query.update(descriptor(1), 0).unwrap().await.unwrap());
    assert_eq!(data(&handle.state()), Some("2024-01-01"));

    let release = gate.hold(day(2));
    let task = query.update(descriptor(2), 0).unwrap();
    release.send(Err(server_error())).unwrap();
    assert!(task.await.unwrap());

    let state = handle.state();
    assert_eq!(state.error, Some(server_error()));
    assert_eq!(data(&state), Some("2024-01-01"));
    assert!(!state.loading);

    assert!(query.update(descriptor(3), 0).unwrap().await.unwrap());
    let state = handle.state();
    assert!(state.error.is_none());
    assert_eq!(data(&state), Some("2024-01-03"));
}

// ── Dedup and refresh ───────────────────────────────────────────────

#[tokio::test]
async fn unchanged_descriptor_is_not_reissued() {
    let mut query = StatsQuery::new(Gated(Arc::default()));

    tokio_test::assert_ok!(query.update(descriptor(1), 0).unwrap().await);
    assert!(query.update(descriptor(1), 0).is_none());
    assert_eq!(query.state().issued(), 1);

    assert!(query.update(descriptor(1), 1).is_some());
    assert_eq!(query.state().issued(), 2);
}

#[tokio::test]
async fn refetch_reissues_last_descriptor() {
    let mut query = StatsQuery::new(Gated(Arc::default()));
    assert!(query.refetch().is_none());

    tokio_test::assert_ok!(query.update(descriptor(4), 0).unwrap().await);
    tokio_test::assert_ok!(query.refetch().unwrap().await);

    let state = query.state();
    assert_eq!(state.issued(), 2);
    assert_eq!(state.descriptor, Some(descriptor(4)));
}

// ── Session wiring ──────────────────────────────────────────────────

fn session_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

#[tokio::test]
async fn spawned_query_follows_filter_and_refresh() {
    let session = DashboardSession::with_clock(Arc::new(MemoryStore::new()), session_today);
    let handle = session.spawn_query(Echo);

    let first = tokio::time::timeout(Duration::from_secs(5), handle.settled())
        .await
        .unwrap()
        .unwrap();
    let resolved = first.data.unwrap();
    assert_eq!(resolved.end_date, session_today());
    assert_eq!(
        resolved.start_date,
        NaiveDate::from_ymd_opt(2024, 5, 31).unwrap()
    );

    session.filter().toggle_client("Infuse");
    let mut rx = handle.subscribe();
    tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| {
            s.data
                .as_ref()
                .is_some_and(|d| d.clients == vec!["Infuse".to_string()])
        }),
    )
    .await
    .unwrap()
    .unwrap();

    let before = handle.state().issued();
    session.refresh();
    tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| s.issued() > before && s.is_settled()),
    )
    .await
    .unwrap()
    .unwrap();
}

#[tokio::test]
async fn shutdown_stops_drivers() {
    let session = DashboardSession::with_clock(Arc::new(MemoryStore::new()), session_today);
    let handle = session.spawn_query(Echo);
    tokio::time::timeout(Duration::from_secs(5), handle.settled())
        .await
        .unwrap()
        .unwrap();
    let issued = handle.state().issued();

    session.shutdown();
    tokio::task::yield_now().await;
    session.filter().toggle_device("Pixel");
    session.refresh();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(handle.state().issued(), issued);
}
