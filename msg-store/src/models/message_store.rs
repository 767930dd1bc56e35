//! In-memory form of `telegram_messages.json`.
//!
//! Pure operations only; [`crate::MessageFile`] wraps them with locking and persistence.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

use super::message_record::{MessageKind, MessageRecord};
use super::store_stats::StoreStats;
use crate::{LAST_UPDATE_ID, TELEGRAM_CHANNEL};

/// Ordered message history plus ingestion cursors.
///
/// `last_update_id` is the legacy Telegram cursor. It is unrelated to any
/// record's `message_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageStore {
    #[serde(default)]
    pub messages: Vec<MessageRecord>,
    #[serde(default)]
    pub last_update_id: i64,
    /// Per-channel cursors, e.g. `cursors.telegram.last_update_id`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cursors: BTreeMap<String, BTreeMap<String, i64>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of [`MessageStore::bump_retries`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryOutcome {
    /// Stale `seen` flags cleared on pending user messages.
    pub reset_seen: usize,
    /// Pending user messages whose `retry_count` was incremented.
    pub retried: usize,
    /// Highest `retry_count` among the retried messages.
    pub max_retry_count: u32,
}

impl RetryOutcome {
    pub fn should_trigger(&self) -> bool {
        self.retried > 0
    }
}

impl MessageStore {
    /// Canonical conversation: two pending user messages and one processed bot
    /// reply in chat 12345, `last_update_id` 999. Built fresh on every call.
    pub fn sample() -> Self {
        let mut reply =
            MessageRecord::user(102, "system", 12345, "알겠어요", "2026-02-21 10:01:30");
        reply.kind = MessageKind::Bot;
        reply.processed = true;

        Self {
            messages: vec![
                MessageRecord::user(100, "telegram", 12345, "안녕", "2026-02-21 10:00:00"),
                MessageRecord::user(101, "telegram", 12345, "작업 해줘", "2026-02-21 10:01:00"),
                reply,
            ],
            last_update_id: 999,
            ..Default::default()
        }
    }

    /// Reads a cursor; 0 when it was never set.
    pub fn cursor(&self, channel: &str, name: &str) -> i64 {
        if let Some(value) = self.cursors.get(channel).and_then(|c| c.get(name)) {
            return *value;
        }
        if channel == TELEGRAM_CHANNEL && name == LAST_UPDATE_ID {
            return self.last_update_id;
        }
        0
    }

    /// Moves a cursor forward to `value`. Smaller values are ignored.
    ///
    /// Returns whether the cursor changed.
    pub fn advance_cursor(&mut self, channel: &str, name: &str, value: i64) -> bool {
        if value <= self.cursor(channel, name) {
            return false;
        }
        self.cursors
            .entry(channel.to_string())
            .or_default()
            .insert(name.to_string(), value);
        if channel == TELEGRAM_CHANNEL && name == LAST_UPDATE_ID {
            self.last_update_id = self.last_update_id.max(value);
        }
        true
    }

    /// Copies the legacy `last_update_id` into `cursors.telegram.last_update_id` when absent.
    pub fn migrate_cursors(&mut self) -> bool {
        let telegram = self.cursors.entry(TELEGRAM_CHANNEL.to_string()).or_default();
        if telegram.contains_key(LAST_UPDATE_ID) {
            return false;
        }
        telegram.insert(LAST_UPDATE_ID.to_string(), self.last_update_id);
        true
    }

    /// Appends records whose `message_id` is not stored yet and advances the
    /// channel's `last_update_id` cursor. Returns the number appended.
    pub fn merge_new(
        &mut self,
        records: Vec<MessageRecord>,
        channel: &str,
        max_update_id: i64,
    ) -> usize {
        self.migrate_cursors();
        let mut known: HashSet<_> = self.messages.iter().map(|m| m.message_id.clone()).collect();
        let mut added = 0;
        for record in records {
            if known.insert(record.message_id.clone()) {
                self.messages.push(record);
                added += 1;
            }
        }
        self.advance_cursor(channel, LAST_UPDATE_ID, max_update_id);
        added
    }

    /// Marks every unprocessed record processed. Returns how many changed.
    pub fn mark_all_processed(&mut self) -> usize {
        let mut cleared = 0;
        for message in self.messages.iter_mut().filter(|m| !m.processed) {
            message.processed = true;
            cleared += 1;
        }
        cleared
    }

    /// Drops processed records stamped at or before `cutoff`.
    ///
    /// Unprocessed records and records with unparseable timestamps are kept.
    pub fn prune_processed_before(&mut self, cutoff: NaiveDateTime) -> usize {
        let before = self.messages.len();
        self.messages.retain(|m| {
            !m.processed || m.parsed_timestamp().map_or(true, |ts| ts > cutoff)
        });
        before - self.messages.len()
    }

    /// Clears stale `seen` flags and bumps `retry_count` on pending user
    /// messages still below `max_retries`.
    pub fn bump_retries(&mut self, max_retries: u32) -> RetryOutcome {
        let mut outcome = RetryOutcome::default();
        for message in self.messages.iter_mut().filter(|m| m.is_pending_user_message()) {
            if message.seen {
                message.seen = false;
                outcome.reset_seen += 1;
            }
            if message.retry_count < max_retries {
                message.retry_count += 1;
                outcome.retried += 1;
                outcome.max_retry_count = outcome.max_retry_count.max(message.retry_count);
            }
        }
        outcome
    }

    /// User messages not processed yet, in store order.
    pub fn unprocessed(&self) -> impl Iterator<Item = &MessageRecord> {
        self.messages.iter().filter(|m| m.is_pending_user_message())
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats::from_messages(&self.messages, self.last_update_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{parse_timestamp, MessageId};

    fn user(id: i64, ts: &str) -> MessageRecord {
        MessageRecord::user(id, "telegram", 1, format!("m{}", id), ts)
    }

    #[test]
    fn test_default_store_is_empty() {
        let store = MessageStore::default();
        assert!(store.messages.is_empty());
        assert_eq!(store.last_update_id, 0);
        assert_eq!(store.cursor(TELEGRAM_CHANNEL, LAST_UPDATE_ID), 0);
    }

    #[test]
    fn test_cursor_falls_back_to_legacy_field() {
        let store = MessageStore {
            last_update_id: 55,
            ..Default::default()
        };
        assert_eq!(store.cursor(TELEGRAM_CHANNEL, LAST_UPDATE_ID), 55);
        assert_eq!(store.cursor("slack", LAST_UPDATE_ID), 0);
    }

    #[test]
    fn test_advance_cursor_never_moves_back() {
        let mut store = MessageStore::default();
        assert!(store.advance_cursor(TELEGRAM_CHANNEL, LAST_UPDATE_ID, 10));
        assert!(!store.advance_cursor(TELEGRAM_CHANNEL, LAST_UPDATE_ID, 3));
        assert_eq!(store.cursor(TELEGRAM_CHANNEL, LAST_UPDATE_ID), 10);
        assert_eq!(store.last_update_id, 10);

        assert!(store.advance_cursor("discord", "last_message_id", 4));
        assert_eq!(store.last_update_id, 10);
    }

    #[test]
    fn test_migrate_cursors_copies_legacy_value_once() {
        let mut store = MessageStore {
            last_update_id: 7,
            ..Default::default()
        };
        assert!(store.migrate_cursors());
        assert_eq!(store.cursors[TELEGRAM_CHANNEL][LAST_UPDATE_ID], 7);
        store.last_update_id = 9;
        assert!(!store.migrate_cursors());
        assert_eq!(store.cursors[TELEGRAM_CHANNEL][LAST_UPDATE_ID], 7);
    }

    #[test]
    fn test_merge_new_skips_known_ids() {
        let mut store = MessageStore::default();
        store.messages.push(user(1, "2026-02-21 10:00:00"));

        let added = store.merge_new(
            vec![user(1, "2026-02-21 10:00:00"), user(2, "2026-02-21 10:00:05")],
            TELEGRAM_CHANNEL,
            501,
        );

        assert_eq!(added, 1);
        assert_eq!(store.messages.len(), 2);
        assert_eq!(store.messages[1].message_id, MessageId::Number(2));
        assert_eq!(store.last_update_id, 501);
        assert_eq!(store.cursor(TELEGRAM_CHANNEL, LAST_UPDATE_ID), 501);
    }

    #[test]
    fn test_mark_all_processed_counts_changes() {
        let mut store = MessageStore::default();
        store.messages.push(user(1, "2026-02-21 10:00:00"));
        store.messages.push(user(2, "2026-02-21 10:00:01"));
        store.messages[1].processed = true;

        assert_eq!(store.mark_all_processed(), 1);
        assert!(store.messages.iter().all(|m| m.processed));
        assert_eq!(store.mark_all_processed(), 0);
    }

    #[test]
    fn test_prune_keeps_unprocessed_and_unparseable() {
        let mut store = MessageStore::default();
        let mut old_done = user(1, "2025-01-01 00:00:00");
        old_done.processed = true;
        let old_pending = user(2, "2025-01-01 00:00:00");
        let mut garbled_done = user(3, "yesterday");
        garbled_done.processed = true;
        let mut recent_done = user(4, "2026-02-21 10:00:00");
        recent_done.processed = true;
        store.messages = vec![old_done, old_pending, garbled_done, recent_done];

        let cutoff = parse_timestamp("2026-01-01 00:00:00").unwrap();
        assert_eq!(store.prune_processed_before(cutoff), 1);

        let ids: Vec<_> = store.messages.iter().map(|m| m.message_id.to_string()).collect();
        assert_eq!(ids, vec!["2", "3", "4"]);
    }

    #[test]
    fn test_bump_retries_respects_limit_and_resets_seen() {
        let mut store = MessageStore::default();
        let mut seen = user(1, "2026-02-21 10:00:00");
        seen.seen = true;
        let mut exhausted = user(2, "2026-02-21 10:00:01");
        exhausted.retry_count = 3;
        let mut bot = user(3, "2026-02-21 10:00:02");
        bot.kind = MessageKind::Bot;
        store.messages = vec![seen, exhausted, bot];

        let outcome = store.bump_retries(3);

        assert_eq!(outcome.reset_seen, 1);
        assert_eq!(outcome.retried, 1);
        assert_eq!(outcome.max_retry_count, 1);
        assert!(outcome.should_trigger());
        assert!(!store.messages[0].seen);
        assert_eq!(store.messages[1].retry_count, 3);
        assert_eq!(store.messages[2].retry_count, 0);
    }

    #[test]
    fn test_unprocessed_yields_pending_user_messages() {
        let mut store = MessageStore::default();
        store.messages.push(user(1, "2026-02-21 10:00:00"));
        let mut done = user(2, "2026-02-21 10:00:01");
        done.processed = true;
        store.messages.push(done);

        let pending: Vec<_> = store.unprocessed().map(|m| m.message_id.clone()).collect();
        assert_eq!(pending, vec![MessageId::Number(1)]);
    }

    #[test]
    fn test_empty_cursors_are_not_serialized() {
        let value = serde_json::to_value(MessageStore::default()).unwrap();
        assert_eq!(value, serde_json::json!({"messages": [], "last_update_id": 0}));
    }
}
