// ABOUTME: Configuration management for ticketwarden
// ABOUTME: Loads the YAML file, resolves receivers against defaults and applies env overrides

pub mod error;
pub mod receiver;
pub mod store;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use error::{ConfigError, Result};
pub use receiver::{ReceiverConfig, ReceiverSpec, Secret};
pub use store::{ConfigStore, Snapshot};

/// File layout, before receivers are resolved
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    defaults: ReceiverSpec,

    #[serde(default)]
    receivers: Vec<ReceiverSpec>,

    #[serde(default)]
    templates: Vec<PathBuf>,

    #[serde(default = "default_http_timeout", with = "humantime_serde")]
    http_timeout: Duration,

    #[serde(default)]
    logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub receivers: Vec<ReceiverConfig>,

    /// Template files, relative paths already joined onto the config directory
    pub templates: Vec<PathBuf>,

    #[serde(with = "humantime_serde")]
    pub http_timeout: Duration,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Config {
    /// Load configuration from file path or default locations
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::find_config_file(),
        };

        let contents =
            std::fs::read_to_string(&config_path).map_err(|source| ConfigError::IoError {
                path: config_path.clone(),
                source,
            })?;
        let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

        let mut config = Self::from_yaml(&contents, base_dir)?;
        config.merge_env()?;
        Ok(config)
    }

    /// Parse and resolve configuration text. Relative template paths are
    /// taken relative to `base_dir`.
    pub fn from_yaml(contents: &str, base_dir: &Path) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(contents)?;

        if file.receivers.is_empty() {
            return Err(ConfigError::NoReceivers);
        }

        let mut seen = HashSet::new();
        let mut receivers = Vec::with_capacity(file.receivers.len());
        for spec in &file.receivers {
            let receiver = spec.resolve(&file.defaults)?;
            if !seen.insert(receiver.name.clone()) {
                return Err(ConfigError::DuplicateReceiver(receiver.name));
            }
            receivers.push(receiver);
        }

        let templates = file
            .templates
            .into_iter()
            .map(|p| if p.is_relative() { base_dir.join(p) } else { p })
            .collect();

        Ok(Self {
            receivers,
            templates,
            http_timeout: file.http_timeout,
            logging: file.logging,
        })
    }

    pub fn receiver_by_name(&self, name: &str) -> Option<&ReceiverConfig> {
        self.receivers.iter().find(|r| r.name == name)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> PathBuf {
        let possible_paths = [
            PathBuf::from("ticketwarden.yaml"),
            PathBuf::from("ticketwarden.yml"),
            PathBuf::from(".ticketwarden.yaml"),
        ];

        for path in &possible_paths {
            if path.exists() {
                return path.clone();
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            let home_config = home_dir.join(".ticketwarden").join("config.yaml");
            if home_config.exists() {
                return home_config;
            }
        }

        // Default path (may not exist)
        PathBuf::from("ticketwarden.yaml")
    }

    /// Merge environment variables into configuration
    fn merge_env(&mut self) -> Result<()> {
        if let Ok(level) = std::env::var("TICKETWARDEN_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("TICKETWARDEN_LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Ok(timeout) = std::env::var("TICKETWARDEN_HTTP_TIMEOUT") {
            self.http_timeout =
                humantime::parse_duration(&timeout).map_err(|e| ConfigError::EnvError {
                    var: "TICKETWARDEN_HTTP_TIMEOUT",
                    message: e.to_string(),
                })?;
        }

        Ok(())
    }
}
