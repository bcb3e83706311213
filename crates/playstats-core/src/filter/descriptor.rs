// ── Query descriptor ──
//
// The fully resolved request shape. Two descriptors are equal exactly when
// they would produce the same request, so a query can skip re-issuing on
// an unchanged descriptor.

use chrono::{Days, Local, NaiveDate};
use playstats_api::StatsParams;
use serde::Serialize;

use super::state::{FilterSnapshot, WindowMode};

/// Source of "today" for resolving relative windows.
pub type Clock = fn() -> NaiveDate;

/// The local calendar date.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Concrete date bounds plus sorted dimension ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QueryDescriptor {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub clients: Vec<String>,
    pub devices: Vec<String>,
    pub users: Vec<String>,
}

impl QueryDescriptor {
    /// Resolve a snapshot as of `today`.
    ///
    /// Relative windows cover `[today - days, today]`; explicit ranges are
    /// passed through. Ids come out sorted because the snapshot keeps them
    /// in ordered sets.
    pub fn resolve(snapshot: &FilterSnapshot, today: NaiveDate) -> Self {
        let (start_date, end_date) = match (snapshot.mode(), snapshot.range()) {
            (WindowMode::ExplicitRange, Some(range)) => (range.start(), range.end()),
            _ => Self::relative_window(today, snapshot.days()),
        };

        Self {
            start_date,
            end_date,
            clients: snapshot.clients().iter().cloned().collect(),
            devices: snapshot.devices().iter().cloned().collect(),
            users: snapshot.users().iter().cloned().collect(),
        }
    }

    /// `(today - days, today)`, clamped at the earliest representable date.
    pub fn relative_window(today: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
        let start = today
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        (start, today)
    }

    pub fn to_params(&self) -> StatsParams {
        StatsParams::from(self)
    }
}

impl From<&QueryDescriptor> for StatsParams {
    fn from(d: &QueryDescriptor) -> Self {
        StatsParams {
            start_date: d.start_date,
            end_date: d.end_date,
            clients: d.clients.clone(),
            devices: d.devices.clone(),
            users: d.users.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::filter::FilterState;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn relative_window_counts_back_from_today() {
        let filter = FilterState::default();
        filter.set_days(7).unwrap();

        let d = filter.snapshot().descriptor(date(2024, 3, 10));
        assert_eq!(d.start_date, date(2024, 3, 3));
        assert_eq!(d.end_date, date(2024, 3, 10));
    }

    #[test]
    fn explicit_range_passes_through() {
        let filter = FilterState::default();
        filter
            .set_explicit_range(date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();

        let d = filter.snapshot().descriptor(date(2024, 6, 1));
        assert_eq!((d.start_date, d.end_date), (date(2024, 1, 1), date(2024, 1, 31)));
    }

    #[test]
    fn toggle_order_does_not_matter() {
        let a = FilterState::default();
        a.toggle_client("zeta");
        a.toggle_client("alpha");
        a.toggle_user("bob");

        let b = FilterState::default();
        b.toggle_user("bob");
        b.toggle_client("alpha");
        b.toggle_client("zeta");

        let today = date(2024, 5, 5);
        let da = a.snapshot().descriptor(today);
        assert_eq!(da, b.snapshot().descriptor(today));
        assert_eq!(da.clients, vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn same_days_on_another_day_is_a_new_descriptor() {
        let filter = FilterState::default();
        let snap = filter.snapshot();
        assert_ne!(
            snap.descriptor(date(2024, 5, 5)),
            snap.descriptor(date(2024, 5, 6))
        );
    }

    #[test]
    fn params_mirror_descriptor() {
        let filter = FilterState::default();
        filter.toggle_device("Living Room");
        let d = filter.snapshot().descriptor(date(2024, 5, 5));

        let params = d.to_params();
        assert_eq!(params.start_date, d.start_date);
        assert_eq!(params.devices, vec!["Living Room".to_string()]);
        assert!(params.clients.is_empty());
    }
}
