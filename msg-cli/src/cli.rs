//! CLI parser and config loading.

use anyhow::Result;
use clap::{Parser, Subcommand};
use msg_store::StoreConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "msgstore")]
#[command(about = "Inspect and maintain telegram_messages.json", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Data directory holding the messages file (overrides DATA_DIR).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Print message counts, chats, time range and cursor.
    Stats,
    /// Remove processed messages older than the retention period.
    Cleanup {
        /// Retention in days (overrides MESSAGE_RETENTION_DAYS).
        #[arg(short, long, value_parser = clap::value_parser!(i64).range(0..))]
        days: Option<i64>,
    },
    /// Mark every pending message processed.
    MarkProcessed,
    /// Bump retry counters of pending user messages.
    Retry {
        /// Retry limit (overrides RETRY_MAX).
        #[arg(short, long)]
        max: Option<u32>,
    },
    /// Store a bot response replying to the given message ids.
    Reply {
        #[arg(long, allow_negative_numbers = true)]
        chat_id: i64,
        #[arg(long = "reply-to", required = true, num_args = 1..)]
        reply_to: Vec<i64>,
        #[arg(short, long)]
        text: String,
        #[arg(long, default_value = "system")]
        channel: String,
    },
    /// Write the three-message sample conversation.
    SeedSample {
        /// Overwrite an existing messages file.
        #[arg(long)]
        force: bool,
    },
}

/// Loads StoreConfig from env; `data_dir` overrides DATA_DIR when given.
pub fn load_config(data_dir: Option<PathBuf>) -> Result<StoreConfig> {
    let mut config = StoreConfig::from_env()?;
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    Ok(config)
}
