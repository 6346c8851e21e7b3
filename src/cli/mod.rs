// ABOUTME: CLI module for ticketwarden
// ABOUTME: Exports command line interface components and main application logic

pub mod app;
pub mod args;
pub mod commands;

pub use app::App;
pub use args::{Args, Commands};
