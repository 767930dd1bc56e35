//! # msg-cli
//!
//! Operator CLI over `telegram_messages.json`: argument parsing, config loading, command handlers.

pub mod cli;
pub mod commands;

pub use cli::{load_config, Cli, Commands};
pub use commands::run;
