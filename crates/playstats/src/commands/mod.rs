//! Command dispatch: bridges CLI args -> session filter -> stats queries ->
//! output formatting.

pub mod config_cmd;
pub mod names;
pub mod prefs;
pub mod stats;
pub mod util;

use playstats_core::DashboardSession;

use crate::cli::{Command, GlobalOpts};
use crate::config::Config;
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    session: &mut DashboardSession,
    config: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Overview(filter) => stats::overview(session, &filter, config, global).await,
        Command::Trend(filter) => stats::trend(session, &filter, config, global).await,
        Command::Recent(args) => stats::recent(session, args, config, global).await,
        Command::Top(args) => stats::top(session, args, config, global).await,
        Command::Options => stats::options(session, config, global).await,
        Command::Whoami => stats::whoami(config, global).await,
        // Local and completion commands are handled before dispatch
        Command::Names(_) | Command::Prefs(_) | Command::Config(_) | Command::Completions(_) => {
            Err(CliError::Internal("local command routed to backend dispatch".into()))
        }
    }
}
