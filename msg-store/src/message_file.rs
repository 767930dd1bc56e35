//! File-backed message store: `telegram_messages.json` plus its `.lock` sibling.
//!
//! Saves are atomic (temp file in the same directory, fsync, rename). Every
//! read-modify-write runs under an exclusive advisory lock on `<file>.lock`, so
//! concurrent writers in other threads or processes never lose updates.

use chrono::{Duration, Local, NaiveDateTime};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::models::{Attachment, MessageRecord, MessageStore, RetryOutcome};

/// Handle on one message store file. Cheap to clone; holds no open descriptors.
#[derive(Debug, Clone)]
pub struct MessageFile {
    path: PathBuf,
    lock_path: PathBuf,
}

/// Held for the duration of a read-modify-write; unlocks on drop.
struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl MessageFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_path = path.clone().into_os_string();
        lock_path.push(".lock");
        Self {
            path,
            lock_path: PathBuf::from(lock_path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    /// Strict load: `Ok(None)` when the file does not exist, errors on unreadable or invalid JSON.
    pub fn try_load(&self) -> Result<Option<MessageStore>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Loads the store. A missing file yields an empty store; so does a
    /// corrupt one, after logging a warning.
    pub fn load(&self) -> MessageStore {
        match self.try_load() {
            Ok(Some(store)) => store,
            Ok(None) => MessageStore::default(),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to read message store, using empty store"
                );
                MessageStore::default()
            }
        }
    }

    /// Atomically replaces the file with `store` (pretty JSON, UTF-8 kept as is).
    pub fn save(&self, store: &MessageStore) -> Result<()> {
        let dir = self.dir();
        fs::create_dir_all(dir)?;

        // Dropping `tmp` on any error path removes the temp file.
        let mut tmp = tempfile::Builder::new()
            .suffix(".json.tmp")
            .tempfile_in(dir)?;
        {
            let mut writer = BufWriter::new(&mut tmp);
            serde_json::to_writer_pretty(&mut writer, store)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Persist {
            path: self.path.display().to_string(),
            source: e.error,
        })?;

        debug!(
            path = %self.path.display(),
            messages = store.messages.len(),
            "Saved message store"
        );
        Ok(())
    }

    fn lock(&self) -> Result<StoreLock> {
        fs::create_dir_all(self.dir())?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        file.lock()?;
        debug!(lock = %self.lock_path.display(), "Acquired message store lock");
        Ok(StoreLock { file })
    }

    /// Load, apply `modify`, save; all under the exclusive lock. Returns what `modify` returned.
    ///
    /// Loads strictly: a file that fails to parse aborts the write and is left untouched.
    pub fn load_and_modify<F, R>(&self, modify: F) -> Result<R>
    where
        F: FnOnce(&mut MessageStore) -> R,
    {
        let _lock = self.lock()?;
        let mut store = self.try_load()?.unwrap_or_default();
        let result = modify(&mut store);
        self.save(&store)?;
        Ok(result)
    }

    /// Like [`Self::load_and_modify`], but skips the save when `modify` reports zero changes.
    fn modify_counted<F>(&self, modify: F) -> Result<usize>
    where
        F: FnOnce(&mut MessageStore) -> usize,
    {
        let _lock = self.lock()?;
        let mut store = self.try_load()?.unwrap_or_default();
        let changed = modify(&mut store);
        if changed > 0 {
            self.save(&store)?;
        }
        Ok(changed)
    }

    /// Appends a processed bot reply so conversation context is kept. Returns the stored record.
    pub fn save_bot_response(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: &[i64],
        files: Vec<Attachment>,
        channel: &str,
    ) -> Result<MessageRecord> {
        let record = MessageRecord::bot_reply(chat_id, text, reply_to.to_vec(), files, channel)
            .ok_or_else(|| {
                StoreError::InvalidInput("bot response needs at least one reply_to id".into())
            })?;

        let stored = record.clone();
        self.load_and_modify(move |store| store.messages.push(record))?;

        info!(chat_id, reply_to = ?reply_to, "Saved bot response");
        Ok(stored)
    }

    /// Appends new transport messages (deduplicated by `message_id`) and
    /// advances the channel cursor. Returns the number appended.
    pub fn merge_new_messages(
        &self,
        records: Vec<MessageRecord>,
        channel: &str,
        max_update_id: i64,
    ) -> Result<usize> {
        let added =
            self.load_and_modify(|store| store.merge_new(records, channel, max_update_id))?;
        info!(channel, added, max_update_id, "Merged new messages");
        Ok(added)
    }

    /// Marks every pending message processed. Returns how many changed.
    pub fn mark_all_processed(&self) -> Result<usize> {
        let cleared = self.modify_counted(MessageStore::mark_all_processed)?;
        if cleared > 0 {
            info!(cleared, "Marked pending messages processed");
        }
        Ok(cleared)
    }

    /// Clears stale `seen` flags and bumps retry counters of pending user messages.
    pub fn bump_retries(&self, max_retries: u32) -> Result<RetryOutcome> {
        let outcome = self.load_and_modify(|store| store.bump_retries(max_retries))?;
        if outcome.reset_seen > 0 {
            info!(reset = outcome.reset_seen, "Reset stale seen flags");
        }
        if outcome.should_trigger() {
            info!(
                retried = outcome.retried,
                retry = outcome.max_retry_count,
                "Retrying unprocessed messages"
            );
        }
        Ok(outcome)
    }

    /// Moves a cursor forward under the lock. Returns whether it changed.
    pub fn advance_cursor(&self, channel: &str, name: &str, value: i64) -> Result<bool> {
        let changed = self.modify_counted(|store| store.advance_cursor(channel, name, value) as usize)?;
        Ok(changed > 0)
    }

    /// Reads a cursor without taking the lock.
    pub fn cursor(&self, channel: &str, name: &str) -> i64 {
        self.load().cursor(channel, name)
    }

    /// Removes processed messages older than `retention_days`. Returns how many were removed.
    ///
    /// Negative or out-of-range retention is rejected before the file is touched.
    pub fn cleanup_old_messages(&self, retention_days: i64) -> Result<usize> {
        if retention_days < 0 {
            return Err(StoreError::InvalidInput(format!(
                "retention days must not be negative: {}",
                retention_days
            )));
        }
        let cutoff = Duration::try_days(retention_days)
            .and_then(|retention| Local::now().naive_local().checked_sub_signed(retention))
            .ok_or_else(|| {
                StoreError::InvalidInput(format!("retention days out of range: {}", retention_days))
            })?;
        let removed = self.cleanup_before(cutoff)?;
        if removed > 0 {
            info!(
                removed,
                retention_days, "Removed processed messages past retention"
            );
        }
        Ok(removed)
    }

    /// Removes processed messages stamped at or before `cutoff`.
    pub fn cleanup_before(&self, cutoff: NaiveDateTime) -> Result<usize> {
        self.modify_counted(|store| store.prune_processed_before(cutoff))
    }
}
