//! Statistics command handlers.

use serde::Serialize;
use tabled::Tabled;

use playstats_core::{
    DashboardSession, FilterOptionsQuery, Leaderboard, LeaderboardEntry, LeaderboardQuery,
    MappingKind, Overview, OverviewStats, PlayTrend, RecentActivity, RecentItem, TrendPoint,
};

use crate::cli::{FilterArgs, GlobalOpts, RecentArgs, TopArgs};
use crate::commands::util;
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

// ── Overview ─────────────────────────────────────────────────────────

pub async fn overview(
    session: &DashboardSession,
    filter: &FilterArgs,
    config: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::apply_filter(session, filter)?;
    let client = config::build_client(global, config)?;
    let data = util::fetch(session, Overview::new(client)).await?;

    let descriptor = session.descriptor();
    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &*data,
        |s: &OverviewStats| {
            output::detail_lines(
                &[
                    (
                        "Window",
                        format!("{} .. {}", descriptor.start_date, descriptor.end_date),
                    ),
                    ("Plays", output::format_count(s.total_plays)),
                    ("Watch time", output::format_hours(s.total_duration_hours)),
                    ("Per play", average_play(s)),
                    ("Users", output::format_count(s.unique_users)),
                    ("Items", output::format_count(s.unique_items)),
                ],
                color,
            )
        },
        |s| s.total_plays.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
fn average_play(s: &OverviewStats) -> String {
    if s.total_plays == 0 {
        return "-".into();
    }
    let seconds = (s.total_duration_hours.max(0.0) * 3600.0 / s.total_plays as f64).round();
    output::format_duration(seconds as u64)
}

// ── Trend ────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct TrendRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Plays")]
    plays: u64,
    #[tabled(rename = "Watch time")]
    watch_time: String,
}

pub async fn trend(
    session: &DashboardSession,
    filter: &FilterArgs,
    config: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::apply_filter(session, filter)?;
    let client = config::build_client(global, config)?;
    let data = util::fetch(session, PlayTrend::new(client)).await?;

    let out = output::render_list(
        global.output,
        data.as_slice(),
        |p: &TrendPoint| TrendRow {
            date: p.date.to_string(),
            plays: p.plays,
            watch_time: output::format_hours(p.duration_hours),
        },
        |p| format!("{}\t{}", p.date, p.plays),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Recent ───────────────────────────────────────────────────────────

#[derive(Tabled)]
struct RecentRow {
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "User")]
    user: String,
}

pub async fn recent(
    session: &DashboardSession,
    args: RecentArgs,
    config: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::apply_filter(session, &args.filter)?;
    let limit = args.limit.unwrap_or(config.defaults.recent_limit);
    let client = config::build_client(global, config)?;
    let data = util::fetch(session, RecentActivity::with_limit(client, limit)).await?;

    let out = output::render_list(
        global.output,
        data.as_slice(),
        |item: &RecentItem| RecentRow {
            when: item
                .time
                .as_deref()
                .map(output::format_local_time)
                .unwrap_or_default(),
            title: item.display_title().to_string(),
            user: item.username.clone().unwrap_or_default(),
        },
        |item| item.display_title().to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Leaderboards ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct Ranked {
    rank: usize,
    name: String,
    label: String,
    play_count: u64,
    duration_hours: f64,
}

#[derive(Tabled)]
struct RankedRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Plays")]
    plays: u64,
    #[tabled(rename = "Watch time")]
    watch_time: String,
}

fn mapping_kind(board: Leaderboard) -> Option<MappingKind> {
    match board {
        Leaderboard::Clients => Some(MappingKind::Client),
        Leaderboard::Devices => Some(MappingKind::Device),
        Leaderboard::Content | Leaderboard::Users => None,
    }
}

fn rank_entries(
    session: &DashboardSession,
    board: Leaderboard,
    entries: &[LeaderboardEntry],
) -> Vec<Ranked> {
    let kind = mapping_kind(board);
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| Ranked {
            rank: i + 1,
            name: e.name.clone(),
            label: kind.map_or_else(
                || e.name.clone(),
                |k| session.names().resolve_label(k, &e.name).to_string(),
            ),
            play_count: e.play_count,
            duration_hours: e.duration_hours,
        })
        .collect()
}

pub async fn top(
    session: &DashboardSession,
    args: TopArgs,
    config: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::apply_filter(session, &args.filter)?;
    let board = Leaderboard::from(args.board);
    let client = config::build_client(global, config)?;
    let source = LeaderboardQuery::with_limit(client, board, args.limit);
    let data = util::fetch(session, source).await?;

    let ranked = rank_entries(session, board, &data);
    let out = output::render_list(
        global.output,
        ranked.as_slice(),
        |r: &Ranked| RankedRow {
            rank: r.rank,
            name: util::with_raw_id(&r.label, &r.name),
            plays: r.play_count,
            watch_time: output::format_hours(r.duration_hours),
        },
        |r| r.label.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Filter options ───────────────────────────────────────────────────

#[derive(Serialize)]
struct OptionEntry {
    kind: &'static str,
    id: String,
    label: String,
}

#[derive(Tabled)]
struct OptionRow {
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Label")]
    label: String,
}

pub async fn options(
    session: &mut DashboardSession,
    config: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let client = config::build_client(global, config)?;
    let data = util::fetch(session, FilterOptionsQuery::new(client)).await?;
    session.apply_filter_options(&data);

    let names = session.names();
    let mut entries = Vec::new();
    for (kind, tag) in [(MappingKind::Client, "client"), (MappingKind::Device, "device")] {
        entries.extend(names.available(kind).into_iter().map(|id| OptionEntry {
            kind: tag,
            id: id.to_string(),
            label: names.resolve_label(kind, id).to_string(),
        }));
    }
    entries.extend(data.users.iter().map(|u| OptionEntry {
        kind: "user",
        id: u.id.clone(),
        label: u.name.clone().unwrap_or_else(|| u.id.clone()),
    }));

    let out = output::render_list(
        global.output,
        entries.as_slice(),
        |e: &OptionEntry| OptionRow {
            kind: e.kind,
            id: e.id.clone(),
            label: e.label.clone(),
        },
        |e| format!("{}\t{}", e.kind, e.id),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Login state ──────────────────────────────────────────────────────

pub async fn whoami(config: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let client = config::build_client(global, config)?;
    let status = client
        .auth_status()
        .await
        .map_err(playstats_core::CoreError::from)?;

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &status,
        |s| {
            output::detail_lines(
                &[
                    ("Server", client.base_url().to_string()),
                    (
                        "Logged in",
                        if s.authenticated { "yes" } else { "no" }.to_string(),
                    ),
                    ("User", s.username.clone().unwrap_or_else(|| "-".into())),
                ],
                color,
            )
        },
        |s| s.username.clone().unwrap_or_default(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_play_per_item() {
        let stats = OverviewStats {
            total_plays: 4,
            total_duration_hours: 2.0,
            ..OverviewStats::default()
        };
        assert_eq!(average_play(&stats), "30:00");
        assert_eq!(average_play(&OverviewStats::default()), "-");
    }

    #[test]
    fn only_client_and_device_boards_are_renamed() {
        assert_eq!(mapping_kind(Leaderboard::Clients), Some(MappingKind::Client));
        assert_eq!(mapping_kind(Leaderboard::Devices), Some(MappingKind::Device));
        assert_eq!(mapping_kind(Leaderboard::Users), None);
    }
}
