//! Preference handlers.

use serde::Serialize;

use playstats_core::{DAY_PRESETS, DashboardSession, Theme};

use crate::cli::{GlobalOpts, PrefsArgs, PrefsCommand};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct PrefsView {
    theme: Theme,
    default_days: u32,
    state_file: String,
}

pub fn handle(
    session: &mut DashboardSession,
    args: PrefsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        PrefsCommand::Show => {}
        PrefsCommand::Theme { theme } => {
            let prefs = session.preferences_mut();
            match theme {
                Some(theme) => prefs.set_theme(theme.into()),
                None => {
                    prefs.toggle_theme();
                }
            }
            check_saved(session)?;
        }
        PrefsCommand::DefaultDays { days } => {
            session.select_days(days)?;
            check_saved(session)?;
            if !DAY_PRESETS.contains(&days) {
                tracing::info!(days, presets = ?DAY_PRESETS, "custom default window");
            }
        }
    }

    let prefs = session.preferences();
    let view = PrefsView {
        theme: prefs.theme(),
        default_days: prefs.default_days(),
        state_file: playstats_config::state_path().display().to_string(),
    };
    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &view,
        |v| {
            output::detail_lines(
                &[
                    ("Theme", v.theme.to_string()),
                    ("Default window", format!("{} days", v.default_days)),
                    ("State file", v.state_file.clone()),
                ],
                color,
            )
        },
        |v| format!("{}\t{}", v.theme, v.default_days),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn check_saved(session: &DashboardSession) -> Result<(), CliError> {
    match session.preferences().last_write_error() {
        Some(err) => Err(err.clone().into()),
        None => Ok(()),
    }
}
