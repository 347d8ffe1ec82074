//! In-memory log — useful for testing and ephemeral deployments.

use async_trait::async_trait;
use pixie_core::conversation::{truncate_to_capacity, ConversationLog, LogEntry};
use pixie_core::error::MemoryError;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A conversation log held in a Vec.
/// History is lost when the process exits.
#[derive(Clone)]
pub struct InMemoryLog {
    entries: Arc<RwLock<Vec<LogEntry>>>,
}

impl InMemoryLog {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Start from existing entries (truncated to capacity).
    pub fn with_entries(mut entries: Vec<LogEntry>) -> Self {
        truncate_to_capacity(&mut entries);
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }
}

impl Default for InMemoryLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationLog for InMemoryLog {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(&self, entry: LogEntry) -> Result<(), MemoryError> {
        let mut entries = self.entries.write().await;
        entries.push(entry);
        truncate_to_capacity(&mut entries);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<LogEntry>, MemoryError> {
        Ok(self.entries.read().await.clone())
    }

    async fn tail(&self, k: usize) -> Result<Vec<LogEntry>, MemoryError> {
        let entries = self.entries.read().await;
        let start = entries.len().saturating_sub(k);
        Ok(entries[start..].to_vec())
    }

    async fn len(&self) -> Result<usize, MemoryError> {
        Ok(self.entries.read().await.len())
    }
}
