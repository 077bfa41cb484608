//! Append-only JSON-lines history log

use ads_core::HistoryRecord;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::error::{StoreError, StoreResult};
use crate::traits::HistoryStore;

/// History store writing one JSON object per line
///
/// Writes are serialized through a mutex so lines never interleave.
#[derive(Debug)]
pub struct FileHistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record back, oldest first
    pub async fn read_all(&self) -> StoreResult<Vec<HistoryRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path).await?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str::<HistoryRecord>(line).map_err(StoreError::from))
            .collect()
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    #[instrument(skip(self, record), fields(rule_id = %record.rule_id, history_id = %record.id))]
    async fn append(&self, record: &HistoryRecord) -> StoreResult<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!("Appended history record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ads_core::{ExecutionSource, Rule, RuleConfig, RuleStatus};
    use tempfile::TempDir;

    fn rule(id: &str) -> Rule {
        Rule {
            id: id.into(),
            name: id.into(),
            status: RuleStatus::Active,
            asset_id: "a1".into(),
            owner_id: "u1".into(),
            config: RuleConfig {
                condition_groups: vec![],
                combination_mode: Default::default(),
                actions: vec![],
            },
        }
    }

    #[tokio::test]
    async fn test_append_and_read_back() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileHistoryStore::new(temp_dir.path().join("logs").join("history.jsonl"));

        let mut first = HistoryRecord::new(&rule("r1"), ExecutionSource::Cron);
        first.set_error("no data in range");
        let second = HistoryRecord::new(&rule("r2"), ExecutionSource::Api);
        store.append(&first).await.unwrap();
        store.append(&second).await.unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(content.lines().count(), 2);

        let records = store.read_all().await.unwrap();
        assert_eq!(records, vec![first, second]);
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileHistoryStore::new(temp_dir.path().join("history.jsonl"));
        assert!(store.read_all().await.unwrap().is_empty());
    }
}
