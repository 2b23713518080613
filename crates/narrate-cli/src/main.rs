//! CLI entry point.
//!
//! Loads `.env`, parses flags, installs logging, bootstraps the
//! orchestrator and dispatches to a handler.

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use narrate_cli::handlers::speak::SpeakArgs;
use narrate_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = CliConfig::from_args(&cli.settings).context("Invalid playback settings")?;
    let ctx = bootstrap(config).context("Failed to set up playback")?;

    match command {
        Commands::Speak {
            text,
            file,
            with_voice,
            document,
            no_controls,
        } => {
            let args = SpeakArgs {
                text,
                file,
                voice: with_voice,
                document,
                controls: !no_controls,
            };
            handlers::speak::execute(ctx, args).await?;
        }
        Commands::Check => handlers::check::execute(&ctx),
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Exit explicitly: a pending stdin read would otherwise hold the runtime open.
    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e:#}");
            e.downcast_ref::<CliError>().map_or(1, CliError::exit_code)
        }
    };
    std::process::exit(code);
}
