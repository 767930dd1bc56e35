//! Message record model for `telegram_messages.json`.
//!
//! One entry of the `messages` array. Field names match the JSON file exactly;
//! keys this model does not know about are kept in `extra` so a load/save cycle
//! never drops data written by other channels.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Wire format of `timestamp` (local time, second precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses a record timestamp. Returns `None` for anything not in [`TIMESTAMP_FORMAT`].
pub fn parse_timestamp(ts: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).ok()
}

/// Formats a timestamp the way records store it.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Message id: numeric for transport messages, textual (`bot_<id>`) for bot replies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    Number(i64),
    Text(String),
}

impl MessageId {
    /// Id given to a bot reply answering `reply_to`.
    pub fn bot_reply(reply_to: i64) -> Self {
        MessageId::Text(format!("bot_{}", reply_to))
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        MessageId::Number(id)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Number(n) => write!(f, "{}", n),
            MessageId::Text(s) => f.write_str(s),
        }
    }
}

/// Conversation id: numeric for Telegram, textual for channels such as Slack (`C0123`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Number(i64),
    Text(String),
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        ChatId::Number(id)
    }
}

impl PartialEq<i64> for ChatId {
    fn eq(&self, other: &i64) -> bool {
        matches!(self, ChatId::Number(n) if n == other)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Number(n) => write!(f, "{}", n),
            ChatId::Text(s) => f.write_str(s),
        }
    }
}

/// Who authored the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Bot,
}

/// File attached to a message (photo, document, video, audio, voice).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Attachment {
    /// Attachment of the given kind stored at `path`.
    pub fn new(kind: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            path: Some(path.into()),
            name: None,
            mime_type: None,
            size: None,
            duration: None,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub message_id: MessageId,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub channel: String,
    pub chat_id: ChatId,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub files: Vec<Attachment>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub processed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<MessageId>,
    /// Ids of the user messages a bot reply answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<Vec<MessageId>>,
    /// Picked up by an executor that has not finished yet.
    #[serde(default, skip_serializing_if = "is_false")]
    pub seen: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub retry_count: u32,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_false(v: &bool) -> bool {
    !*v
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

impl MessageRecord {
    /// Creates an unprocessed user message.
    pub fn user(
        message_id: i64,
        channel: impl Into<String>,
        chat_id: i64,
        text: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self::bare(
            MessageId::Number(message_id),
            MessageKind::User,
            channel.into(),
            chat_id,
            text.into(),
            timestamp.into(),
            false,
        )
    }

    /// Creates a processed bot reply to `reply_to`, timestamped now (local time).
    ///
    /// `reply_to` must not be empty; the first id names the reply (`bot_<id>`).
    pub fn bot_reply(
        chat_id: i64,
        text: impl Into<String>,
        reply_to: Vec<i64>,
        files: Vec<Attachment>,
        channel: impl Into<String>,
    ) -> Option<Self> {
        let first = *reply_to.first()?;
        let reply_to = reply_to.into_iter().map(MessageId::Number).collect();
        let mut record = Self::bare(
            MessageId::bot_reply(first),
            MessageKind::Bot,
            channel.into(),
            chat_id,
            text.into(),
            format_timestamp(Local::now().naive_local()),
            true,
        );
        record.files = files;
        record.reply_to = Some(reply_to);
        Some(record)
    }

    fn bare(
        message_id: MessageId,
        kind: MessageKind,
        channel: String,
        chat_id: i64,
        text: String,
        timestamp: String,
        processed: bool,
    ) -> Self {
        Self {
            message_id,
            kind,
            channel,
            chat_id: ChatId::Number(chat_id),
            text,
            files: Vec::new(),
            timestamp,
            processed,
            update_id: None,
            user_id: None,
            username: None,
            first_name: None,
            last_name: None,
            location: None,
            reply_to_message_id: None,
            reply_to: None,
            seen: false,
            retry_count: 0,
            extra: Map::new(),
        }
    }

    /// Parsed `timestamp`, or `None` when it is missing or malformed.
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.timestamp)
    }

    pub fn is_pending_user_message(&self) -> bool {
        self.kind == MessageKind::User && !self.processed
    }
}
