//! Persistence of relayed turns for the `/chats` export.

mod postgres;

pub use postgres::PgChatLog;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tonebridge_core::chatlog::ChatLogEntry;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("stored chat log entry is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Append-only store of chat turns.
#[async_trait]
pub trait ChatLogStore: Send + Sync {
    /// Short name reported by `/health`.
    fn backend(&self) -> &'static str;

    async fn record(&self, entry: ChatLogEntry) -> Result<(), StoreError>;

    /// Every entry, oldest first.
    async fn list(&self) -> Result<Vec<ChatLogEntry>, StoreError>;

    /// Drop every entry.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryChatLog {
    entries: RwLock<Vec<ChatLogEntry>>,
}

impl InMemoryChatLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatLogStore for InMemoryChatLog {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn record(&self, entry: ChatLogEntry) -> Result<(), StoreError> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ChatLogEntry>, StoreError> {
        let mut entries = self.entries.read().await.clone();
        entries.sort_by_key(|e| e.time);
        Ok(entries)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.entries.write().await.clear();
        Ok(())
    }
}
