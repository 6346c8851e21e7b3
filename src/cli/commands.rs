// ABOUTME: Command implementations for the ticketwarden CLI
// ABOUTME: Handles check-config, show-config and one-shot notify commands

use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::alert::AlertGroup;
use crate::config::ConfigStore;
use crate::dispatch::Dispatcher;
use crate::tracker::JiraConnector;

/// Validate configuration and templates
pub fn check_config(store: &ConfigStore) -> Result<()> {
    let snapshot = store.snapshot();

    println!("✓ Configuration is valid");
    println!("  Receivers: {}", snapshot.config.receivers.len());
    for receiver in &snapshot.config.receivers {
        println!("    - {} (project {})", receiver.name, receiver.project);
    }
    println!("  Template files: {}", snapshot.config.templates.len());

    info!("All checks passed");
    Ok(())
}

/// Print the resolved configuration
pub fn show_config(store: &ConfigStore) -> Result<()> {
    let snapshot = store.snapshot();
    let yaml = serde_yaml::to_string(&snapshot.config)?;
    print!("{}", yaml);
    Ok(())
}

/// Deliver a single webhook payload
pub async fn notify(
    store: Arc<ConfigStore>,
    payload: PathBuf,
    receiver: Option<String>,
) -> Result<()> {
    let body = read_payload(&payload)?;
    let timeout = store.snapshot().config.http_timeout;
    let dispatcher = Dispatcher::new(store, Arc::new(JiraConnector::new(timeout)?));

    let response = match receiver {
        Some(name) => {
            let mut group = AlertGroup::from_json(&body).context("Invalid webhook payload")?;
            group.receiver = name;
            dispatcher.dispatch(&group).await
        }
        None => dispatcher.handle(&body).await,
    };

    match (&response.outcome, &response.error) {
        (_, Some(error)) => Err(anyhow::anyhow!(
            "Notification for receiver {} failed with status {}: {}",
            response.receiver,
            error.status,
            error.message
        )),
        (Some(outcome), None) => {
            println!("{}: {:?}", response.receiver, outcome);
            Ok(())
        }
        (None, None) => {
            println!("{}: no firing alerts, nothing to do", response.receiver);
            Ok(())
        }
    }
}

fn read_payload(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut body = Vec::new();
        std::io::stdin().read_to_end(&mut body)?;
        return Ok(body);
    }

    std::fs::read(path).with_context(|| format!("Failed to read payload {}", path.display()))
}
