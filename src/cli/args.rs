// ABOUTME: Command line argument definitions and parsing using Clap
// ABOUTME: Defines the main CLI structure and subcommands for ticketwarden

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ticketwarden")]
#[command(about = "Files and reopens issue tracker tickets for Alertmanager notifications")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(
        short,
        long,
        global = true,
        env = "TICKETWARDEN_CONFIG",
        help = "Path to configuration file"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the configuration and templates, report problems and exit
    CheckConfig,

    /// Print the resolved configuration with credentials masked
    ShowConfig,

    /// Deliver one Alertmanager webhook payload
    Notify {
        #[arg(help = "Path to webhook JSON payload, or - for stdin")]
        payload: PathBuf,

        #[arg(long, help = "Deliver to this receiver instead of the one named in the payload")]
        receiver: Option<String>,
    },
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
