// ABOUTME: Reloadable configuration snapshot shared by concurrent notifications
// ABOUTME: Compiles templates up front and swaps the whole snapshot atomically on reload

use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{error, info};

use super::error::{ConfigError, Result};
use super::Config;
use crate::template::TemplateEngine;

/// Configuration plus the template set compiled from it
pub struct Snapshot {
    pub config: Config,
    pub templates: TemplateEngine,
}

impl Snapshot {
    /// Load template files and precompile every receiver template
    pub fn build(config: Config) -> Result<Self> {
        let mut templates = TemplateEngine::from_files(config.templates.as_slice())?;

        for receiver in &config.receivers {
            for (field, text) in receiver.templates() {
                templates
                    .precompile(text)
                    .map_err(|source| ConfigError::InvalidTemplate {
                        receiver: receiver.name.clone(),
                        field,
                        source,
                    })?;
            }
        }

        Ok(Self { config, templates })
    }
}

pub struct ConfigStore {
    path: Option<PathBuf>,
    current: RwLock<Arc<Snapshot>>,
}

impl ConfigStore {
    /// Load `path` (or the default location) and build the first snapshot
    pub fn open(path: Option<PathBuf>) -> Result<Self> {
        let snapshot = Snapshot::build(Config::load(path.clone())?)?;
        Ok(Self {
            path,
            current: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// A store that cannot be reloaded from disk
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            path: None,
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The snapshot in effect right now. Callers keep it for a whole run.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Re-read configuration and templates. On failure the previous
    /// snapshot stays in place.
    pub fn reload(&self) -> Result<()> {
        info!(
            "Reloading configuration from {}",
            self.path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "default location".to_string())
        );

        let snapshot = match Config::load(self.path.clone()).and_then(Snapshot::build) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Error loading configuration: {}", e);
                return Err(e);
            }
        };

        self.replace(snapshot);
        info!("Configuration reloaded");
        Ok(())
    }

    pub fn replace(&self, snapshot: Snapshot) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(snapshot);
    }
}
