//! JSONL Feedback Log Adapter
//!
//! Appends records to daily files named after the record's UTC date:
//!
//! ```text
//! {base}/feedback-YYYY-MM-DD.jsonl
//! ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::domain::feedback::FeedbackRecord;
use crate::domain::foundation::Timestamp;
use crate::ports::{FeedbackError, FeedbackRecorder};

/// Append-only feedback files on disk
#[derive(Debug)]
pub struct JsonlFeedbackLog {
    base_path: PathBuf,
    // Appends from concurrent requests must not interleave within a line.
    write_lock: Mutex<()>,
}

impl JsonlFeedbackLog {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// File that records stamped `at` are appended to.
    pub fn file_for(&self, at: &Timestamp) -> PathBuf {
        self.base_path
            .join(format!("feedback-{}.jsonl", at.as_datetime().format("%Y-%m-%d")))
    }
}

#[async_trait]
impl FeedbackRecorder for JsonlFeedbackLog {
    async fn record(&self, record: &FeedbackRecord) -> Result<(), FeedbackError> {
        let mut line =
            serde_json::to_string(record).map_err(|e| FeedbackError::Serialization(e.to_string()))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| FeedbackError::Io(e.to_string()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file_for(&record.recorded_at))
            .await
            .map_err(|e| FeedbackError::Io(e.to_string()))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| FeedbackError::Io(e.to_string()))?;
        file.flush().await.map_err(|e| FeedbackError::Io(e.to_string()))?;

        tracing::debug!(id = %record.id, kind = %record.kind, "feedback appended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::feedback::FeedbackKind;
    use crate::domain::foundation::{SessionId, UserId};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup() -> (JsonlFeedbackLog, TempDir) {
        let dir = TempDir::new().unwrap();
        (JsonlFeedbackLog::new(dir.path().join("feedback")), dir)
    }

    fn record(kind: FeedbackKind, prompt: &str) -> FeedbackRecord {
        FeedbackRecord::new(
            UserId::new("u1").unwrap(),
            SessionId::new("s1").unwrap(),
            kind,
            prompt,
            "an answer",
        )
        .unwrap()
    }

    async fn lines(log: &JsonlFeedbackLog, at: &Timestamp) -> Vec<FeedbackRecord> {
        fs::read_to_string(log.file_for(at))
            .await
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn appends_one_line_per_record() {
        let (log, _dir) = setup();
        let first = record(FeedbackKind::ThumbsUp, "first");
        let second = record(FeedbackKind::Incorrect, "second");

        log.record(&first).await.unwrap();
        log.record(&second).await.unwrap();

        let stored = lines(&log, &first.recorded_at).await;
        assert_eq!(stored, vec![first, second]);
    }

    #[tokio::test]
    async fn records_land_in_the_file_for_their_day() {
        let (log, _dir) = setup();
        let mut old = record(FeedbackKind::Helpful, "yesterday");
        old.recorded_at = Timestamp::now().minus_secs(2 * 24 * 60 * 60);
        let today = record(FeedbackKind::Helpful, "today");

        log.record(&old).await.unwrap();
        log.record(&today).await.unwrap();

        assert_ne!(log.file_for(&old.recorded_at), log.file_for(&today.recorded_at));
        assert_eq!(lines(&log, &old.recorded_at).await, vec![old.clone()]);
        assert_eq!(lines(&log, &today.recorded_at).await, vec![today]);
        let name = log.file_for(&old.recorded_at);
        let name = name.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("feedback-") && name.ends_with(".jsonl"));
    }

    #[tokio::test]
    async fn concurrent_appends_keep_lines_whole() {
        let (log, _dir) = setup();
        let log = Arc::new(log);
        let records: Vec<FeedbackRecord> = (0..20)
            .map(|i| record(FeedbackKind::Detailed, &format!("prompt {}", i)))
            .collect();

        let tasks: Vec<_> = records
            .iter()
            .cloned()
            .map(|r| {
                let log = Arc::clone(&log);
                tokio::spawn(async move { log.record(&r).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stored = lines(&log, &records[0].recorded_at).await;
        assert_eq!(stored.len(), 20);
    }

    #[tokio::test]
    async fn unwritable_directory_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("taken");
        fs::write(&blocker, "not a directory").await.unwrap();
        let log = JsonlFeedbackLog::new(&blocker);

        let err = log.record(&record(FeedbackKind::ThumbsDown, "q")).await.unwrap_err();
        assert!(matches!(err, FeedbackError::Io(_)));
    }
}
