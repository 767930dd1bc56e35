//! Test fixtures: an isolated data directory, the messages file path inside it,
//! and a canonical three-message conversation.
//!
//! Enabled under `cfg(test)` and by the `fixtures` feature.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::message_file::MessageFile;
use crate::models::MessageStore;
use crate::MESSAGES_FILE_NAME;

/// Temporary data directory owned by one test. Removed on drop, whether the
/// test passes, fails an assertion or panics.
#[derive(Debug)]
pub struct TempWorkspace {
    dir: TempDir,
}

impl TempWorkspace {
    /// Creates a fresh, empty directory. Panics if the OS refuses; a test
    /// cannot run without its workspace.
    pub fn new() -> Self {
        Self::try_new().expect("create temp workspace")
    }

    pub fn try_new() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("msg-store-").tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `<workspace>/telegram_messages.json`; not created.
    pub fn messages_file(&self) -> PathBuf {
        self.path().join(MESSAGES_FILE_NAME)
    }

    /// Store handle on [`Self::messages_file`].
    pub fn message_file(&self) -> MessageFile {
        MessageFile::new(self.messages_file())
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Isolated temporary data directory.
pub fn tmp_data_dir() -> TempWorkspace {
    TempWorkspace::new()
}

/// Path of the messages file inside `workspace`. The file does not exist yet.
pub fn messages_file(workspace: &TempWorkspace) -> PathBuf {
    workspace.messages_file()
}

/// Sample store: two pending user messages and one processed bot reply in
/// chat 12345, `last_update_id` 999. Built fresh on every call.
pub fn sample_messages() -> MessageStore {
    MessageStore::sample()
}
