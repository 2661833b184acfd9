use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    ConversationLog,
    UnknownQuestions,
    ComplaintRecords,
    FeedbackRecords,
}

impl StoreKind {
    pub const ALL: [StoreKind; 4] = [
        StoreKind::ConversationLog,
        StoreKind::UnknownQuestions,
        StoreKind::ComplaintRecords,
        StoreKind::FeedbackRecords,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            StoreKind::ConversationLog => "conversation_log.json",
            StoreKind::UnknownQuestions => "unknown_questions.json",
            StoreKind::ComplaintRecords => "complaints.json",
            StoreKind::FeedbackRecords => "feedback.json",
        }
    }
}

#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Appends after every earlier record of the same store.
    async fn append_record(&self, store: StoreKind, record: Value) -> Result<(), StoreError>;
}

/// Adds a fresh `id` and an RFC 3339 `timestamp` to an object record.
pub fn stamped(mut record: Value) -> Value {
    if let Some(fields) = record.as_object_mut() {
        fields.insert("id".to_string(), json!(uuid::Uuid::new_v4().to_string()));
        fields.insert("timestamp".to_string(), json!(chrono::Utc::now().to_rfc3339()));
    }
    record
}

// --- File-backed store ---

/// One JSON array file per store under a directory. Appends rewrite the
/// array through a temporary file and rename it into place.
pub struct JsonFileStore {
    dir: PathBuf,
    locks: HashMap<StoreKind, Mutex<()>>,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            dir,
            locks: StoreKind::ALL.iter().map(|kind| (*kind, Mutex::new(()))).collect(),
        })
    }

    pub fn path(&self, store: StoreKind) -> PathBuf {
        self.dir.join(store.file_name())
    }

    pub async fn read_all(&self, store: StoreKind) -> Result<Vec<Value>, StoreError> {
        let _guard = self.locks[&store].lock().await;
        self.read_unlocked(store).await
    }

    async fn read_unlocked(&self, store: StoreKind) -> Result<Vec<Value>, StoreError> {
        let path = self.path(store);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io { path: path.display().to_string(), source })
            }
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            path: path.display().to_string(),
            source,
        })
    }
}

#[async_trait]
impl PersistenceSink for JsonFileStore {
    async fn append_record(&self, store: StoreKind, record: Value) -> Result<(), StoreError> {
        let _guard = self.locks[&store].lock().await;
        let mut records = self.read_unlocked(store).await?;
        records.push(record);

        let path = self.path(store);
        let tmp = path.with_extension("json.tmp");
        let encoded = serde_json::to_string_pretty(&records)?;
        let io_err = |source| StoreError::Io { path: path.display().to_string(), source };
        tokio::fs::write(&tmp, encoded).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &path).await.map_err(io_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn keeps_insertion_order_per_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        for question in ["first", "second", "third"] {
            store
                .append_record(StoreKind::UnknownQuestions, json!({ "question": question }))
                .await
                .unwrap();
        }
        let records = store.read_all(StoreKind::UnknownQuestions).await.unwrap();
        let questions: Vec<_> = records.iter().map(|r| r["question"].clone()).collect();
        assert_eq!(questions, vec![json!("first"), json!("second"), json!("third")]);
        assert!(store.read_all(StoreKind::FeedbackRecords).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_appends_lose_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileStore::new(dir.path()).unwrap());
        let tasks: Vec<_> = (0..25)
            .map(|n| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .append_record(StoreKind::ConversationLog, json!({ "n": n }))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(store.read_all(StoreKind::ConversationLog).await.unwrap().len(), 25);
    }

    #[tokio::test]
    async fn corrupt_file_is_reported_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        std::fs::write(store.path(StoreKind::ComplaintRecords), "{not json").unwrap();

        let err = store
            .append_record(StoreKind::ComplaintRecords, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        let raw = std::fs::read_to_string(store.path(StoreKind::ComplaintRecords)).unwrap();
        assert_eq!(raw, "{not json");
    }

    #[test]
    fn stamped_records_carry_id_and_timestamp() {
        let record = stamped(json!({ "name": "Ann" }));
        assert_eq!(record["name"], "Ann");
        assert!(record["id"].as_str().is_some_and(|id| id.len() == 36));
        assert!(record["timestamp"].is_string());
    }
}
