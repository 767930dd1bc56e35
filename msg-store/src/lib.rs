//! msg-store crate: `telegram_messages.json` persistence for the bot.
//!
//! ## Modules
//!
//! - [`error`] – Store error types
//! - [`models`] – MessageRecord, MessageStore, StoreStats
//! - [`message_file`] – MessageFile (atomic save, locked read-modify-write)
//! - [`config`] – StoreConfig loaded from env
//! - [`logger`] – tracing initialization
//! - [`fixtures`] – temp workspace and sample dataset for tests (feature `fixtures`)

pub mod config;
mod error;
pub mod logger;
mod message_file;
mod models;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;


pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use logger::init_tracing;
pub use message_file::MessageFile;
pub use models::{
    format_timestamp, parse_timestamp, Attachment, ChatId, MessageId, MessageKind, MessageRecord,
    MessageStore, RetryOutcome, StoreStats, TIMESTAMP_FORMAT,
};

/// File name of the message store inside the data directory.
pub const MESSAGES_FILE_NAME: &str = "telegram_messages.json";

/// Channel whose cursor mirrors the legacy top-level `last_update_id`.
pub const TELEGRAM_CHANNEL: &str = "telegram";

/// Cursor name used for Telegram `getUpdates` offsets.
pub const LAST_UPDATE_ID: &str = "last_update_id";
