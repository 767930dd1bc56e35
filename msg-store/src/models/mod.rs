//! Data model of `telegram_messages.json`.

mod message_record;
mod message_store;
mod store_stats;

pub use message_record::{
    format_timestamp, parse_timestamp, Attachment, ChatId, MessageId, MessageKind, MessageRecord,
    TIMESTAMP_FORMAT,
};
pub use message_store::{MessageStore, RetryOutcome};
pub use store_stats::StoreStats;
