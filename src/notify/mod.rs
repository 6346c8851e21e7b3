// ABOUTME: Reconciliation engine for alert groups
// ABOUTME: Decides whether to leave, reopen or create the tracker issue for a group

pub mod decision;
pub mod error;
pub mod receiver;

pub use decision::{Decision, ReopenPolicy};
pub use error::{NotifyError, Result};
pub use receiver::{Notifier, Outcome};
