// ABOUTME: Main application orchestration for the ticketwarden CLI
// ABOUTME: Loads configuration, initializes logging and dispatches subcommands

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use super::commands;
use super::{Args, Commands};
use crate::config::{ConfigStore, LoggingConfig};

pub struct App {
    store: Arc<ConfigStore>,
}

impl App {
    /// Create a new application instance
    pub fn new(store: ConfigStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Initialize logging based on configuration
    pub fn init_logging(logging: &LoggingConfig, verbose: bool, no_color: bool) {
        let log_level = if verbose {
            "debug"
        } else {
            logging.level.as_str()
        };

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        let result = match logging.format.as_str() {
            "compact" => tracing_subscriber::fmt()
                .compact()
                .with_env_filter(env_filter)
                .with_ansi(!no_color)
                .with_target(false)
                .try_init(),
            _ => tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_ansi(!no_color)
                .with_target(false)
                .try_init(),
        };

        // A subscriber may already be installed (tests, embedding)
        if result.is_ok() {
            debug!("Logging initialized with level: {}", log_level);
        }
    }

    /// Run the application with parsed arguments
    pub async fn run(&self, args: Args) -> Result<()> {
        let snapshot = self.store.snapshot();
        Self::init_logging(&snapshot.config.logging, args.verbose, args.no_color);

        info!("Starting ticketwarden v{}", env!("CARGO_PKG_VERSION"));
        debug!("Configuration loaded from: {:?}", args.config);

        match args.command {
            Commands::CheckConfig => commands::check_config(&self.store),
            Commands::ShowConfig => commands::show_config(&self.store),
            Commands::Notify { payload, receiver } => {
                commands::notify(Arc::clone(&self.store), payload, receiver).await
            }
        }
    }

    /// Create application from command line arguments
    pub fn from_args(args: &Args) -> Result<Self> {
        let store = ConfigStore::open(args.config.clone())?;
        Ok(Self::new(store))
    }
}
