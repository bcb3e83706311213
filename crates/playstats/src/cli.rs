//! Clap derive structures for the `playstats` CLI.
//!
//! Defines the command tree, global flags, and the filter flags shared by
//! every stats query.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use playstats_core::{Leaderboard, MappingKind, Theme};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// playstats -- playback statistics from the command line
#[derive(Debug, Parser)]
#[command(
    name = "playstats",
    version,
    about = "Query media server playback statistics from the command line",
    long_about = "Query a playback statistics backend from the command line.\n\n\
        Every stats command takes the same filter flags (time window,\n\
        clients, devices, users). Label overrides and preferences are\n\
        stored locally and shared across invocations.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "PLAYSTATS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend URL (overrides profile)
    #[arg(long, short = 's', env = "PLAYSTATS_SERVER", global = true)]
    pub server: Option<String>,

    /// Session token sent as the `session` cookie
    #[arg(long, env = "PLAYSTATS_SESSION_TOKEN", global = true, hide_env_values = true)]
    pub session_token: Option<String>,

    /// Output format [default: `output` from the config, else table]
    #[arg(
        long = "output",
        short = 'o',
        env = "PLAYSTATS_OUTPUT",
        value_name = "FORMAT",
        global = true
    )]
    pub output_flag: Option<OutputFormat>,

    /// Effective output format, settled by [`GlobalOpts::resolve_output`].
    #[arg(skip)]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "PLAYSTATS_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

impl GlobalOpts {
    /// Settle `output`: flag or env var first, then the configured default.
    /// An unknown configured value falls back to table.
    pub fn resolve_output(&mut self, configured: &str) {
        self.output = self.output_flag.unwrap_or_else(|| {
            OutputFormat::from_str(configured, true).unwrap_or_else(|_| {
                tracing::warn!(value = configured, "unknown output format in config");
                OutputFormat::Table
            })
        });
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Totals for the selected window
    #[command(alias = "ov")]
    Overview(FilterArgs),

    /// Plays per day
    Trend(FilterArgs),

    /// Recently played items
    #[command(alias = "history")]
    Recent(RecentArgs),

    /// Ranked breakdowns (content, users, clients, devices)
    Top(TopArgs),

    /// Clients, devices and users known to the backend
    Options,

    /// Show the login state for the active session token
    Whoami,

    /// Manage display names for clients and devices
    Names(NamesArgs),

    /// Show or change stored preferences
    Prefs(PrefsArgs),

    /// Manage backend profiles in the config file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Filter Arguments ─────────────────────────────────────────────────

/// Filter flags shared by every stats query.
#[derive(Debug, Args, Default)]
pub struct FilterArgs {
    /// Trailing window in days (defaults to the stored preference)
    #[arg(long, short = 'd', conflicts_with_all = ["from", "to"])]
    pub days: Option<u32>,

    /// Range start (YYYY-MM-DD)
    #[arg(long, requires = "to")]
    pub from: Option<NaiveDate>,

    /// Range end (YYYY-MM-DD)
    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,

    /// Restrict to a client (repeatable)
    #[arg(long = "client", value_name = "ID")]
    pub clients: Vec<String>,

    /// Restrict to a device (repeatable)
    #[arg(long = "device", value_name = "ID")]
    pub devices: Vec<String>,

    /// Restrict to a user id (repeatable)
    #[arg(long = "user", value_name = "ID")]
    pub users: Vec<String>,
}

#[derive(Debug, Args)]
pub struct RecentArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Max items (defaults to `recent_limit` in the config)
    #[arg(long, short = 'l')]
    pub limit: Option<u32>,
}

#[derive(Debug, Args)]
pub struct TopArgs {
    /// Which breakdown to show
    pub board: Board,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Max rows
    #[arg(long, short = 'l', default_value = "10")]
    pub limit: u32,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Board {
    /// Most played titles
    Content,
    /// Most active users
    Users,
    /// Most used client applications
    Clients,
    /// Most used playback devices
    Devices,
}

impl From<Board> for Leaderboard {
    fn from(board: Board) -> Self {
        match board {
            Board::Content => Leaderboard::Content,
            Board::Users => Leaderboard::Users,
            Board::Clients => Leaderboard::Clients,
            Board::Devices => Leaderboard::Devices,
        }
    }
}

// ── Names ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NamesArgs {
    #[command(subcommand)]
    pub command: NamesCommand,
}

#[derive(Debug, Subcommand)]
pub enum NamesCommand {
    /// List label overrides
    #[command(alias = "ls")]
    List {
        /// Only this kind
        #[arg(long, short = 'k')]
        kind: Option<NameKind>,
    },

    /// Set a label override (an empty label clears it)
    Set {
        kind: NameKind,
        raw_id: String,
        label: String,
    },

    /// Remove a label override
    #[command(alias = "rm")]
    Clear { kind: NameKind, raw_id: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum NameKind {
    Client,
    Device,
}

impl From<NameKind> for MappingKind {
    fn from(kind: NameKind) -> Self {
        match kind {
            NameKind::Client => MappingKind::Client,
            NameKind::Device => MappingKind::Device,
        }
    }
}

// ── Preferences ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PrefsArgs {
    #[command(subcommand)]
    pub command: PrefsCommand,
}

#[derive(Debug, Subcommand)]
pub enum PrefsCommand {
    /// Show stored preferences
    Show,

    /// Set the theme, or toggle it when no value is given
    Theme { theme: Option<ThemeArg> },

    /// Set the default window in days
    DefaultDays { days: u32 },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(theme: ThemeArg) -> Self {
        match theme {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// List profiles (session tokens redacted)
    #[command(alias = "ls")]
    Profiles,

    /// Add or replace a profile
    SetProfile {
        /// Profile name
        name: String,

        /// Backend URL
        #[arg(long)]
        url: String,

        /// Environment variable holding the session token
        #[arg(long)]
        token_env: Option<String>,

        /// Make this the default profile
        #[arg(long)]
        default: bool,
    },

    /// Make an existing profile the default
    Use { name: String },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
