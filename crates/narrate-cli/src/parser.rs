//! Main CLI parser and top-level argument handling.
//!
//! Settings flags are global and fall back to `NARRATE_*` environment
//! variables (a `.env` file is loaded before parsing).

use clap::{Args, Parser};

use crate::commands::Commands;

/// Command-line interface for narrate.
#[derive(Parser)]
#[command(name = "narrate")]
#[command(about = "Read text aloud with a remote or on-device voice")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub settings: SettingsArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Playback settings, from flags or environment.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Remote synthesis endpoint (http:// or https://)
    #[arg(long = "endpoint", env = "NARRATE_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Bearer token for the remote endpoint
    #[arg(long = "api-key", env = "NARRATE_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Default premium voice
    #[arg(long = "voice", env = "NARRATE_VOICE", global = true)]
    pub voice: Option<String>,

    /// Premium voice entitlement
    #[arg(long = "premium", env = "NARRATE_PREMIUM", global = true)]
    pub premium: bool,

    /// Abort superseded remote requests instead of letting them finish
    #[arg(long = "abort-superseded", env = "NARRATE_ABORT_SUPERSEDED", global = true)]
    pub abort_superseded: bool,

    /// On-device speech program (default: espeak-ng, or say on macOS)
    #[arg(long = "local-program", env = "NARRATE_LOCAL_PROGRAM", global = true)]
    pub local_program: Option<String>,

    /// Extra argument for the on-device program (repeatable; replaces the rate flag)
    #[arg(long = "local-arg", global = true, allow_hyphen_values = true)]
    pub local_args: Vec<String>,

    /// On-device speaking rate in words per minute
    #[arg(long = "rate", env = "NARRATE_RATE", global = true)]
    pub rate: Option<u32>,
}
