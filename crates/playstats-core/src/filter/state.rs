// ── Reactive filter state ──
//
// Immutable snapshots published through a `watch` channel. Every mutation
// clones the current snapshot, edits the copy and swaps it in, so readers
// holding an older `Arc` never observe a half-applied change.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::sync::watch;
use tracing::debug;

use super::descriptor::{Clock, QueryDescriptor, local_today};
use crate::error::CoreError;

/// Trailing windows offered as one-click choices.
pub const DAY_PRESETS: [u32; 4] = [7, 30, 90, 365];

/// Relative window used when no preference is stored.
pub const DEFAULT_DAYS: u32 = 30;

/// Which of `days` / `range` is authoritative.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WindowMode {
    #[default]
    Relative,
    ExplicitRange,
}

/// A calendar range with `start <= end`, enforced at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// Dimensional filters. An empty set means "no restriction".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Client,
    Device,
    User,
}

/// Immutable view of the filter state at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterSnapshot {
    mode: WindowMode,
    days: u32,
    range: Option<DateRange>,
    clients: BTreeSet<String>,
    devices: BTreeSet<String>,
    users: BTreeSet<String>,
    /// Baseline window for deciding whether an explicit range counts as a filter.
    default_days: u32,
}

impl FilterSnapshot {
    fn new(default_days: u32) -> Self {
        Self {
            mode: WindowMode::Relative,
            days: default_days,
            range: None,
            clients: BTreeSet::new(),
            devices: BTreeSet::new(),
            users: BTreeSet::new(),
            default_days,
        }
    }

    pub fn mode(&self) -> WindowMode {
        self.mode
    }

    /// Last relative window. Authoritative only in [`WindowMode::Relative`].
    pub fn days(&self) -> u32 {
        self.days
    }

    /// Last explicit range. Authoritative only in [`WindowMode::ExplicitRange`].
    pub fn range(&self) -> Option<DateRange> {
        self.range
    }

    pub fn default_days(&self) -> u32 {
        self.default_days
    }

    pub fn selected(&self, dimension: Dimension) -> &BTreeSet<String> {
        match dimension {
            Dimension::Client => &self.clients,
            Dimension::Device => &self.devices,
            Dimension::User => &self.users,
        }
    }

    pub fn clients(&self) -> &BTreeSet<String> {
        &self.clients
    }

    pub fn devices(&self) -> &BTreeSet<String> {
        &self.devices
    }

    pub fn users(&self) -> &BTreeSet<String> {
        &self.users
    }

    /// Whether `days` is the selected relative preset (for chip highlighting).
    pub fn is_relative(&self, days: u32) -> bool {
        self.mode == WindowMode::Relative && self.days == days
    }

    /// Non-empty dimensions, plus one for an explicit range that differs
    /// from the default relative window as of `today`.
    pub fn active_filter_count_at(&self, today: NaiveDate) -> usize {
        let dimensions = [&self.clients, &self.devices, &self.users]
            .into_iter()
            .filter(|set| !set.is_empty())
            .count();

        let custom_range = match (self.mode, self.range) {
            (WindowMode::ExplicitRange, Some(range)) => {
                let default = QueryDescriptor::relative_window(today, self.default_days);
                (range.start, range.end) != default
            }
            _ => false,
        };

        dimensions + usize::from(custom_range)
    }

    /// Resolve into concrete request parameters.
    pub fn descriptor(&self, today: NaiveDate) -> QueryDescriptor {
        QueryDescriptor::resolve(self, today)
    }

    fn selected_mut(&mut self, dimension: Dimension) -> &mut BTreeSet<String> {
        match dimension {
            Dimension::Client => &mut self.clients,
            Dimension::Device => &mut self.devices,
            Dimension::User => &mut self.users,
        }
    }
}

/// The session's filter state.
///
/// Mutations are synchronous. Each one publishes a fresh snapshot to every
/// subscriber; validation failures publish nothing.
pub struct FilterState {
    snapshot: watch::Sender<Arc<FilterSnapshot>>,
    clock: Clock,
}

impl FilterState {
    /// Start in relative mode with `default_days`.
    pub fn new(default_days: u32) -> Self {
        Self::with_clock(default_days, local_today)
    }

    /// Like [`new`](Self::new), judging "today" by `clock`.
    pub fn with_clock(default_days: u32, clock: Clock) -> Self {
        let default_days = default_days.max(1);
        let (snapshot, _) = watch::channel(Arc::new(FilterSnapshot::new(default_days)));
        Self { snapshot, clock }
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    /// Current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<FilterSnapshot> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<FilterSnapshot>> {
        self.snapshot.subscribe()
    }

    /// Active filters for the badge, as of this state's clock.
    pub fn active_filter_count(&self) -> usize {
        self.snapshot.borrow().active_filter_count_at(self.today())
    }

    pub fn has_active_filters(&self) -> bool {
        self.active_filter_count() > 0
    }

    /// The current snapshot resolved as of this state's clock.
    pub fn descriptor(&self) -> QueryDescriptor {
        self.snapshot.borrow().descriptor(self.today())
    }

    // ── Window ───────────────────────────────────────────────────────

    /// Switch to a trailing window of `days`.
    pub fn set_days(&self, days: u32) -> Result<(), CoreError> {
        if days == 0 {
            return Err(CoreError::InvalidDays { days });
        }
        debug!(days, "filter: relative window");
        self.publish(|s| {
            s.mode = WindowMode::Relative;
            s.days = days;
        });
        Ok(())
    }

    /// Switch to a fixed calendar range. Rejected before any state changes
    /// when `start > end`.
    pub fn set_explicit_range(&self, start: NaiveDate, end: NaiveDate) -> Result<(), CoreError> {
        let range = DateRange::new(start, end)?;
        debug!(%start, %end, "filter: explicit range");
        self.publish(|s| {
            s.mode = WindowMode::ExplicitRange;
            s.range = Some(range);
        });
        Ok(())
    }

    /// Return to the last relative window. The explicit range is kept for
    /// a later switch back.
    pub fn use_relative(&self) {
        self.publish(|s| s.mode = WindowMode::Relative);
    }

    /// Move the baseline used by the active-filter count.
    pub fn set_default_days(&self, days: u32) -> Result<(), CoreError> {
        if days == 0 {
            return Err(CoreError::InvalidDays { days });
        }
        self.publish(|s| s.default_days = days);
        Ok(())
    }

    // ── Dimensions ───────────────────────────────────────────────────

    /// Add `id` if absent, remove it if present. Returns whether it is now
    /// selected.
    pub fn toggle(&self, dimension: Dimension, id: &str) -> bool {
        let mut selected = false;
        self.publish(|s| {
            let set = s.selected_mut(dimension);
            selected = if set.remove(id) {
                false
            } else {
                set.insert(id.to_owned())
            };
        });
        debug!(%dimension, id, selected, "filter: toggled");
        selected
    }

    pub fn toggle_client(&self, id: &str) -> bool {
        self.toggle(Dimension::Client, id)
    }

    pub fn toggle_device(&self, id: &str) -> bool {
        self.toggle(Dimension::Device, id)
    }

    pub fn toggle_user(&self, id: &str) -> bool {
        self.toggle(Dimension::User, id)
    }

    /// Drop every dimensional filter. The window is left alone.
    pub fn clear_all(&self) {
        self.publish(|s| {
            s.clients.clear();
            s.devices.clear();
            s.users.clear();
        });
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn publish(&self, edit: impl FnOnce(&mut FilterSnapshot)) {
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|current| {
            let mut next = FilterSnapshot::clone(current);
            edit(&mut next);
            *current = Arc::new(next);
        });
    }
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new(DEFAULT_DAYS)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2024, 6, 30)
    }

    #[test]
    fn toggles_leave_odd_counted_ids() {
        let filter = FilterState::default();
        let sequence = ["a", "b", "a", "c", "b", "b", "d", "d", "d"];
        for id in sequence {
            filter.toggle_client(id);
        }

        let expected: BTreeSet<String> = ["b", "c", "d"].into_iter().map(String::from).collect();
        assert_eq!(filter.snapshot().clients(), &expected);
    }

    #[test]
    fn toggle_reports_selection() {
        let filter = FilterState::default();
        assert!(filter.toggle_user("alice"));
        assert!(!filter.toggle_user("alice"));
        assert!(filter.snapshot().users().is_empty());
    }

    #[test]
    fn dimensions_are_independent() {
        let filter = FilterState::default();
        filter.toggle_client("x");
        filter.toggle_device("x");

        let snap = filter.snapshot();
        assert!(snap.clients().contains("x"));
        assert!(snap.devices().contains("x"));
        assert!(snap.users().is_empty());
    }

    #[test]
    fn invalid_range_leaves_state_untouched() {
        let filter = FilterState::new(7);
        filter.toggle_client("tv");
        let before = filter.snapshot();

        let err = filter
            .set_explicit_range(date(2024, 2, 1), date(2024, 1, 1))
            .unwrap_err();

        assert_eq!(
            err,
            CoreError::InvalidRange {
                start: date(2024, 2, 1),
                end: date(2024, 1, 1),
            }
        );
        assert_eq!(filter.snapshot(), before);
    }

    #[test]
    fn invalid_range_publishes_nothing() {
        let filter = FilterState::default();
        let mut rx = filter.subscribe();
        rx.borrow_and_update();

        let _ = filter.set_explicit_range(date(2024, 2, 1), date(2024, 1, 1));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn explicit_range_is_idempotent() {
        let filter = FilterState::default();
        filter
            .set_explicit_range(date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();
        let first = filter.snapshot();
        filter
            .set_explicit_range(date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();

        assert_eq!(filter.snapshot(), first);
        assert_eq!(first.mode(), WindowMode::ExplicitRange);
    }

    #[test]
    fn single_day_range_is_valid() {
        let filter = FilterState::default();
        assert!(
            filter
                .set_explicit_range(date(2024, 1, 1), date(2024, 1, 1))
                .is_ok()
        );
    }

    #[test]
    fn switching_modes_keeps_inactive_values() {
        let filter = FilterState::default();
        filter.set_days(30).unwrap();
        filter
            .set_explicit_range(date(2024, 3, 1), date(2024, 3, 15))
            .unwrap();
        filter.use_relative();

        let snap = filter.snapshot();
        assert_eq!(snap.mode(), WindowMode::Relative);
        assert_eq!(snap.days(), 30);
        assert_eq!(
            snap.range(),
            Some(DateRange::new(date(2024, 3, 1), date(2024, 3, 15)).unwrap())
        );
    }

    #[test]
    fn set_days_after_range_restores_relative() {
        let filter = FilterState::default();
        filter
            .set_explicit_range(date(2024, 3, 1), date(2024, 3, 15))
            .unwrap();
        filter.set_days(90).unwrap();

        let snap = filter.snapshot();
        assert!(snap.is_relative(90));
        assert!(snap.range().is_some());
    }

    #[test]
    fn zero_days_rejected() {
        let filter = FilterState::default();
        assert_eq!(filter.set_days(0), Err(CoreError::InvalidDays { days: 0 }));
        assert_eq!(filter.snapshot().days(), DEFAULT_DAYS);
    }

    #[test]
    fn active_filter_count_progression() {
        let filter = FilterState::new(7);
        assert_eq!(filter.snapshot().active_filter_count_at(today()), 0);

        filter.toggle_client("Infuse");
        assert_eq!(filter.snapshot().active_filter_count_at(today()), 1);

        filter
            .set_explicit_range(date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();
        assert_eq!(filter.snapshot().active_filter_count_at(today()), 2);
    }

    #[test]
    fn range_matching_default_window_is_not_counted() {
        let filter = FilterState::new(7);
        filter
            .set_explicit_range(date(2024, 6, 23), date(2024, 6, 30))
            .unwrap();
        assert_eq!(filter.snapshot().active_filter_count_at(today()), 0);
    }

    #[test]
    fn badge_follows_injected_clock() {
        let filter = FilterState::with_clock(30, today);
        filter
            .set_explicit_range(date(2024, 5, 31), date(2024, 6, 30))
            .unwrap();
        assert_eq!(filter.active_filter_count(), 0);
        assert!(!filter.has_active_filters());

        filter.toggle_device("living-room");
        filter
            .set_explicit_range(date(2024, 5, 1), date(2024, 6, 30))
            .unwrap();
        assert_eq!(filter.active_filter_count(), 2);
        assert!(filter.has_active_filters());
    }

    #[test]
    fn clear_all_keeps_window() {
        let filter = FilterState::default();
        filter
            .set_explicit_range(date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();
        filter.toggle_client("a");
        filter.toggle_device("b");
        filter.toggle_user("c");

        filter.clear_all();

        let snap = filter.snapshot();
        assert!(snap.clients().is_empty() && snap.devices().is_empty() && snap.users().is_empty());
        assert_eq!(snap.mode(), WindowMode::ExplicitRange);
    }

    #[test]
    fn old_snapshots_are_immutable() {
        let filter = FilterState::default();
        let before = filter.snapshot();
        filter.toggle_client("a");
        assert!(before.clients().is_empty());
        assert_eq!(filter.snapshot().clients().len(), 1);
    }
}
