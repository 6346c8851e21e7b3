// ABOUTME: Main library module for ticketwarden
// ABOUTME: Turns grouped Alertmanager alerts into deduplicated issue tracker tickets

pub mod alert;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod notify;
pub mod template;
pub mod tracker;

// Re-export commonly used types
pub use alert::{Alert, AlertGroup, AlertStatus};
pub use cli::{App, Args};
pub use config::{Config, ConfigStore, ReceiverConfig};
pub use dispatch::{DispatchResponse, Dispatcher};
pub use notify::{Notifier, NotifyError, Outcome};
pub use template::{FieldValue, TemplateEngine};
pub use tracker::{JiraClient, TrackerGateway};

// Error handling
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
