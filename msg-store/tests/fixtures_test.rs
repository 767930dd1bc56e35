//! Integration tests for [`msg_store::fixtures`].
//!
//! Workspaces are isolated and cleaned up; the sample dataset is fixed and independent per call.

use msg_store::fixtures::{messages_file, sample_messages, tmp_data_dir, TempWorkspace};
use msg_store::{MessageId, MessageKind, MESSAGES_FILE_NAME};

/// **Test: Each workspace is a distinct, existing, empty directory.**
#[test]
fn test_workspaces_are_distinct_and_empty() {
    let a = tmp_data_dir();
    let b = tmp_data_dir();

    assert_ne!(a.path(), b.path());
    for ws in [&a, &b] {
        assert!(ws.path().is_dir());
        assert_eq!(std::fs::read_dir(ws.path()).unwrap().count(), 0);
    }
}

/// **Test: Workspace directory is removed on drop.**
#[test]
fn test_workspace_removed_on_drop() {
    let ws = TempWorkspace::new();
    let path = ws.path().to_path_buf();
    std::fs::write(path.join("scratch.txt"), "x").unwrap();

    drop(ws);

    assert!(!path.exists());
}

/// **Test: Workspace is removed even when the test body panics.**
#[test]
fn test_workspace_removed_after_panic() {
    let (tx, rx) = std::sync::mpsc::channel();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
        let ws = TempWorkspace::new();
        tx.send(ws.path().to_path_buf()).unwrap();
        panic!("assertion failed inside test");
    }));

    assert!(result.is_err());
    let path = rx.recv().unwrap();
    assert!(!path.exists());
}

/// **Test: Messages file path is `<workspace>/telegram_messages.json` and not created.**
#[test]
fn test_messages_file_path_not_created() {
    let ws = tmp_data_dir();
    let path = messages_file(&ws);

    assert_eq!(path, ws.path().join("telegram_messages.json"));
    assert_eq!(path.file_name().unwrap(), MESSAGES_FILE_NAME);
    assert!(!path.exists());
    assert_eq!(ws.message_file().path(), path.as_path());
}

/// **Test: Sample dataset shape.**
///
/// **Expected:** 3 records, last_update_id 999, ascending timestamps, only the bot record processed.
#[test]
fn test_sample_dataset_contents() {
    let data = sample_messages();

    assert_eq!(data.messages.len(), 3);
    assert_eq!(data.last_update_id, 999);

    let ids: Vec<_> = data.messages.iter().map(|m| m.message_id.clone()).collect();
    assert_eq!(
        ids,
        vec![MessageId::Number(100), MessageId::Number(101), MessageId::Number(102)]
    );

    let stamps: Vec<_> = data.messages.iter().map(|m| m.parsed_timestamp().unwrap()).collect();
    assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(data.messages[2].timestamp, "2026-02-21 10:01:30");

    let processed: Vec<_> = data.messages.iter().filter(|m| m.processed).collect();
    assert_eq!(processed.len(), 1);
    assert_eq!(processed[0].kind, MessageKind::Bot);
    assert_eq!(processed[0].channel, "system");

    assert!(data.messages.iter().all(|m| m.chat_id == 12345_i64 && m.files.is_empty()));
    assert_eq!(data.messages[0].text, "안녕");
}

/// **Test: Sample dataset serializes to the file format exactly.**
#[test]
fn test_sample_dataset_json_shape() {
    let value = serde_json::to_value(sample_messages()).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "messages": [
                {"message_id": 100, "type": "user", "channel": "telegram", "chat_id": 12345,
                 "text": "안녕", "files": [], "timestamp": "2026-02-21 10:00:00", "processed": false},
                {"message_id": 101, "type": "user", "channel": "telegram", "chat_id": 12345,
                 "text": "작업 해줘", "files": [], "timestamp": "2026-02-21 10:01:00", "processed": false},
                {"message_id": 102, "type": "bot", "channel": "system", "chat_id": 12345,
                 "text": "알겠어요", "files": [], "timestamp": "2026-02-21 10:01:30", "processed": true}
            ],
            "last_update_id": 999
        })
    );
}

/// **Test: Mutating one sample copy does not affect the next.**
#[test]
fn test_sample_dataset_copies_are_independent() {
    let mut first = sample_messages();
    first.messages.pop();
    first.messages[0].text = "changed".to_string();
    first.messages[1].processed = true;
    first.last_update_id = 0;

    let second = sample_messages();

    assert_eq!(second.messages.len(), 3);
    assert_eq!(second.messages[0].text, "안녕");
    assert!(!second.messages[1].processed);
    assert_eq!(second.last_update_id, 999);
    assert_eq!(second, sample_messages());
}
