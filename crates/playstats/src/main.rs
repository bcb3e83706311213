mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let mut cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    let cfg = config::load_config_or_default();
    cli.global.resolve_output(&cfg.defaults.output);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli, &cfg).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli, cfg: &config::Config) -> Result<(), CliError> {
    match cli.command {
        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "playstats", &mut std::io::stdout());
            Ok(())
        }

        // Local state only, no backend needed
        Command::Names(args) => {
            let mut session = config::open_session()?;
            commands::names::handle(&mut session, args, &cli.global)
        }
        Command::Prefs(args) => {
            let mut session = config::open_session()?;
            commands::prefs::handle(&mut session, args, &cli.global)
        }
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // Everything else talks to the backend
        cmd => {
            let mut session = config::open_session()?;

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &mut session, cfg, &cli.global).await;
            session.shutdown();
            result
        }
    }
}
