//! Aggregate statistics for a message store.
//!
//! Returned by MessageStore::stats.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::message_record::{MessageKind, MessageRecord};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_messages: usize,
    pub user_messages: usize,
    pub bot_messages: usize,
    pub processed: usize,
    pub unprocessed: usize,
    pub unique_chats: usize,
    pub first_message: Option<NaiveDateTime>,
    pub last_message: Option<NaiveDateTime>,
    pub last_update_id: i64,
}

impl StoreStats {
    pub(crate) fn from_messages(messages: &[MessageRecord], last_update_id: i64) -> Self {
        let mut stats = StoreStats {
            total_messages: messages.len(),
            last_update_id,
            ..Default::default()
        };
        let mut chats = HashSet::new();

        for message in messages {
            match message.kind {
                MessageKind::User => stats.user_messages += 1,
                MessageKind::Bot => stats.bot_messages += 1,
            }
            if message.processed {
                stats.processed += 1;
            } else {
                stats.unprocessed += 1;
            }
            chats.insert(&message.chat_id);

            if let Some(ts) = message.parsed_timestamp() {
                stats.first_message = Some(stats.first_message.map_or(ts, |t| t.min(ts)));
                stats.last_message = Some(stats.last_message.map_or(ts, |t| t.max(ts)));
            }
        }

        stats.unique_chats = chats.len();
        stats
    }
}
