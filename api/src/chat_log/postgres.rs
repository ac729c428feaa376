use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tonebridge_core::chatlog::ChatLogEntry;

use super::{ChatLogStore, StoreError};

/// Internal row type for sqlx mapping
#[derive(sqlx::FromRow)]
struct ChatLogRow {
    id: uuid::Uuid,
    request: serde_json::Value,
    response: serde_json::Value,
    time: chrono::DateTime<chrono::Utc>,
}

impl ChatLogRow {
    fn into_entry(self) -> Result<ChatLogEntry, StoreError> {
        Ok(ChatLogEntry {
            id: self.id,
            request: serde_json::from_value(self.request)?,
            response: serde_json::from_value(self.response)?,
            time: self.time,
        })
    }
}

/// Chat log kept in the `chat_logs` table.
#[derive(Clone)]
pub struct PgChatLog {
    pool: PgPool,
}

impl PgChatLog {
    /// Connect and bring the schema up to date.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: PgPool) -> Result<Self, StoreError> {
        sqlx::migrate!("../migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl ChatLogStore for PgChatLog {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn record(&self, entry: ChatLogEntry) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO chat_logs (id, request, response, time) VALUES ($1, $2, $3, $4)")
            .bind(entry.id)
            .bind(serde_json::to_value(&entry.request)?)
            .bind(serde_json::to_value(&entry.response)?)
            .bind(entry.time)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ChatLogEntry>, StoreError> {
        let rows = sqlx::query_as::<_, ChatLogRow>(
            "SELECT id, request, response, time FROM chat_logs ORDER BY time ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ChatLogRow::into_entry).collect()
    }

    async fn clear(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM chat_logs").execute(&self.pool).await?;
        Ok(())
    }
}
