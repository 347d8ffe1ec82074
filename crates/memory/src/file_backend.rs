//! File-based conversation log — a pretty-printed JSON array on disk.
//!
//! The file is re-read on every operation, so edits made while the bridge
//! is running (or a file copied in from an earlier deployment) are picked
//! up. All operations on one `FileLog` are serialized by an async mutex:
//! append reads, pushes, truncates and writes under a single lock, and the
//! write goes to a temporary sibling that is renamed over the original.
//!
//! Storage location defaults to `./conversations.json`.

use async_trait::async_trait;
use pixie_core::conversation::{truncate_to_capacity, ConversationLog, LogEntry};
use pixie_core::error::MemoryError;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// How to treat a log file that exists but cannot be read or parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadPolicy {
    /// Warn and behave as if the log were empty.
    #[default]
    FailOpen,
    /// Return `MemoryError::Corrupted`.
    FailClosed,
}

/// A file-backed conversation log.
pub struct FileLog {
    path: PathBuf,
    policy: ReadPolicy,
    lock: Mutex<()>,
}

impl FileLog {
    /// Create a log at the given path. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            policy: ReadPolicy::default(),
            lock: Mutex::new(()),
        }
    }

    pub fn with_read_policy(mut self, policy: ReadPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file as an empty array if it does not exist yet.
    pub async fn ensure_exists(&self) -> Result<(), MemoryError> {
        let _guard = self.lock.lock().await;
        if tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(());
        }
        self.write_entries(&[]).await
    }

    /// Read entries from disk. Caller must hold the lock.
    async fn read_entries(&self) -> Result<Vec<LogEntry>, MemoryError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return self.unreadable(format!("Failed to read log file: {e}")),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let raw: Vec<serde_json::Value> = match serde_json::from_str(&content) {
            Ok(raw) => raw,
            Err(e) => return self.unreadable(format!("Log file is not a JSON array: {e}")),
        };

        let entries: Vec<LogEntry> = raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<LogEntry>(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted log entry");
                    None
                }
            })
            .collect();

        Ok(entries)
    }

    fn unreadable(&self, reason: String) -> Result<Vec<LogEntry>, MemoryError> {
        match self.policy {
            ReadPolicy::FailOpen => {
                warn!(path = %self.path.display(), reason = %reason, "Treating conversation log as empty");
                Ok(Vec::new())
            }
            ReadPolicy::FailClosed => Err(MemoryError::Corrupted(reason)),
        }
    }

    /// Write entries to disk via temp file + rename. Caller must hold the lock.
    async fn write_entries(&self, entries: &[LogEntry]) -> Result<(), MemoryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                MemoryError::Storage(format!("Failed to create log directory: {e}"))
            })?;
        }

        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| MemoryError::Storage(format!("Failed to serialize log: {e}")))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to write log file: {e}")))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to replace log file: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl ConversationLog for FileLog {
    fn name(&self) -> &str {
        "file"
    }

    async fn append(&self, entry: LogEntry) -> Result<(), MemoryError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        entries.push(entry);
        truncate_to_capacity(&mut entries);
        self.write_entries(&entries).await?;
        debug!(path = %self.path.display(), count = entries.len(), "Conversation log written");
        Ok(())
    }

    async fn all(&self) -> Result<Vec<LogEntry>, MemoryError> {
        let _guard = self.lock.lock().await;
        self.read_entries().await
    }
}
