//! Store configuration: data directory, file name, retention and retry limits.
//! Loaded from env: DATA_DIR, MESSAGES_FILE, MESSAGE_RETENTION_DAYS, RETRY_MAX, LOG_FILE.

use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;

use crate::message_file::MessageFile;
use crate::MESSAGES_FILE_NAME;

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_RETENTION_DAYS: i64 = 30;
pub const DEFAULT_RETRY_MAX: u32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub messages_file: String,
    /// Processed messages older than this are removed by cleanup.
    pub retention_days: i64,
    /// Retry limit for pending user messages.
    pub retry_max: u32,
    pub log_file: Option<String>,
}

impl StoreConfig {
    /// Loads from environment variables; every variable is optional.
    pub fn from_env() -> Result<Self> {
        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
        let messages_file =
            env::var("MESSAGES_FILE").unwrap_or_else(|_| MESSAGES_FILE_NAME.to_string());
        let retention_days = match env::var("MESSAGE_RETENTION_DAYS") {
            Ok(v) => v
                .trim()
                .parse()
                .with_context(|| format!("MESSAGE_RETENTION_DAYS is not a number: {}", v))?,
            Err(_) => DEFAULT_RETENTION_DAYS,
        };
        if retention_days < 0 {
            bail!("MESSAGE_RETENTION_DAYS must not be negative: {}", retention_days);
        }
        let retry_max = match env::var("RETRY_MAX") {
            Ok(v) => v
                .trim()
                .parse()
                .with_context(|| format!("RETRY_MAX is not a number: {}", v))?,
            Err(_) => DEFAULT_RETRY_MAX,
        };
        let log_file = env::var("LOG_FILE").ok();

        Ok(Self {
            data_dir,
            messages_file,
            retention_days,
            retry_max,
            log_file,
        })
    }

    /// Defaults rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            messages_file: MESSAGES_FILE_NAME.to_string(),
            retention_days: DEFAULT_RETENTION_DAYS,
            retry_max: DEFAULT_RETRY_MAX,
            log_file: None,
        }
    }

    pub fn messages_path(&self) -> PathBuf {
        self.data_dir.join(&self.messages_file)
    }

    pub fn message_file(&self) -> MessageFile {
        MessageFile::new(self.messages_path())
    }
}
