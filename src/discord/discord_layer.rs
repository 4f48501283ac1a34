// Discord layer - commands and platform-facing adapters.

#[path = "commands/command_catalog.rs"]
pub mod commands;

pub mod action_log;
pub mod monitor_notify;
pub mod permissions;

// Re-export command types for convenience
pub use commands::Data;
