//! Shared helpers for command handlers.

use std::collections::BTreeSet;
use std::sync::Arc;

use playstats_core::{DashboardSession, Dimension, StatsQuery, StatsSource};

use crate::cli::FilterArgs;
use crate::error::CliError;

/// Apply filter flags to the session's filter state.
///
/// Runs before any backend is resolved so invalid input fails without
/// network use. `--days` here is a one-off window and does not change the
/// stored default.
pub fn apply_filter(session: &DashboardSession, args: &FilterArgs) -> Result<(), CliError> {
    let filter = session.filter();
    if let (Some(from), Some(to)) = (args.from, args.to) {
        filter.set_explicit_range(from, to)?;
    } else if let Some(days) = args.days {
        filter.set_days(days)?;
    }

    for (dimension, ids) in [
        (Dimension::Client, &args.clients),
        (Dimension::Device, &args.devices),
        (Dimension::User, &args.users),
    ] {
        // Toggling twice would deselect, so repeated flags collapse first
        for id in ids.iter().collect::<BTreeSet<_>>() {
            filter.toggle(dimension, id);
        }
    }
    Ok(())
}

/// Issue one request for the session's current descriptor and wait for it.
pub async fn fetch<S: StatsSource>(
    session: &DashboardSession,
    source: S,
) -> Result<Arc<S::Output>, CliError> {
    let mut query = StatsQuery::new(source);
    let descriptor = session.descriptor();
    tracing::debug!(source = query.source().name(), ?descriptor, "fetching");

    if let Some(task) = query.update(descriptor, session.nav().refresh_key()) {
        task.await.map_err(|e| CliError::Internal(e.to_string()))?;
    }

    let state = query.state();
    if let Some(err) = state.error {
        return Err(err.into());
    }
    state
        .data
        .ok_or_else(|| CliError::Internal("query finished without data".into()))
}

/// The display label, with the raw id appended when the two differ.
pub fn with_raw_id(label: &str, raw_id: &str) -> String {
    if label == raw_id {
        raw_id.to_string()
    } else {
        format!("{label} ({raw_id})")
    }
}
