// ABOUTME: Alert data model decoded from Alertmanager webhook notifications
// ABOUTME: Exposes alert groups, individual alerts and label helpers used for deduplication

pub mod data;

pub use data::{Alert, AlertGroup, AlertStatus, Labels};
