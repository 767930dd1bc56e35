//! Command handlers. Each returns the text printed to stdout.

use anyhow::{bail, Context, Result};
use msg_store::{format_timestamp, MessageStore, StoreConfig, LAST_UPDATE_ID, TELEGRAM_CHANNEL};
use tracing::info;

use crate::cli::Commands;

/// Runs one command against the store named by `config`.
pub fn run(command: Commands, config: &StoreConfig) -> Result<String> {
    let file = config.message_file();
    info!(path = %file.path().display(), "Using message store");

    match command {
        Commands::Stats => {
            let store = file.load();
            let stats = store.stats();
            let range = match (stats.first_message, stats.last_message) {
                (Some(first), Some(last)) => {
                    format!("{} .. {}", format_timestamp(first), format_timestamp(last))
                }
                _ => "-".to_string(),
            };
            Ok(format!(
                "messages: {} (user {}, bot {})\nprocessed: {}, pending: {}\nchats: {}\ntime range: {}\ntelegram cursor: {}",
                stats.total_messages,
                stats.user_messages,
                stats.bot_messages,
                stats.processed,
                stats.unprocessed,
                stats.unique_chats,
                range,
                store.cursor(TELEGRAM_CHANNEL, LAST_UPDATE_ID),
            ))
        }
        Commands::Cleanup { days } => {
            let days = days.unwrap_or(config.retention_days);
            let removed = file
                .cleanup_old_messages(days)
                .context("cleanup old messages")?;
            Ok(format!("removed {} processed message(s) older than {} days", removed, days))
        }
        Commands::MarkProcessed => {
            let cleared = file.mark_all_processed().context("mark messages processed")?;
            Ok(format!("marked {} message(s) processed", cleared))
        }
        Commands::Retry { max } => {
            let outcome = file
                .bump_retries(max.unwrap_or(config.retry_max))
                .context("bump retries")?;
            if outcome.should_trigger() {
                Ok(format!(
                    "retrying {} pending message(s) (retry #{}), reset {} stale seen flag(s)",
                    outcome.retried, outcome.max_retry_count, outcome.reset_seen
                ))
            } else {
                Ok(format!(
                    "nothing to retry, reset {} stale seen flag(s)",
                    outcome.reset_seen
                ))
            }
        }
        Commands::Reply {
            chat_id,
            reply_to,
            text,
            channel,
        } => {
            let record = file
                .save_bot_response(chat_id, &text, &reply_to, Vec::new(), &channel)
                .context("save bot response")?;
            Ok(format!("saved {} in chat {}", record.message_id, chat_id))
        }
        Commands::SeedSample { force } => {
            if file.exists() && !force {
                bail!(
                    "{} already exists; pass --force to overwrite",
                    file.path().display()
                );
            }
            let sample = MessageStore::sample();
            file.save(&sample).context("write sample messages")?;
            Ok(format!(
                "wrote {} sample message(s) to {}",
                sample.messages.len(),
                file.path().display()
            ))
        }
    }
}
