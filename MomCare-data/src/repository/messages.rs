use async_trait::async_trait;
use rusqlite::{params, Row};
use tracing::debug;

use super::RepositoryError;
use crate::database::DatabasePool;
use crate::models::MessageRecord;

/// Repository trait for chat messages
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: MessageRecord) -> Result<MessageRecord, RepositoryError>;

    /// The latest `limit` messages exchanged between two users, oldest first.
    /// Passing the same id twice returns that user's assistant thread.
    async fn conversation(
        &self,
        user_a: &str,
        user_b: &str,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, RepositoryError>;
}

/// SQLite implementation of [`MessageRepository`]
#[derive(Debug, Clone)]
pub struct SqliteMessageRepository {
    pool: DatabasePool,
}

impl SqliteMessageRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn map_message(row: &Row<'_>) -> rusqlite::Result<MessageRecord> {
    Ok(MessageRecord {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        content: row.get(3)?,
        is_ai: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[async_trait]
impl MessageRepository for SqliteMessageRepository {
    async fn create(&self, message: MessageRecord) -> Result<MessageRecord, RepositoryError> {
        debug!("Storing message in database: id={}", message.id);

        self.pool.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, sender_id, receiver_id, content, is_ai, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    message.id,
                    message.sender_id,
                    message.receiver_id,
                    message.content,
                    message.is_ai,
                    message.created_at,
                ],
            )?;
            Ok(message)
        }).await
    }

    async fn conversation(
        &self,
        user_a: &str,
        user_b: &str,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, RepositoryError> {
        let (user_a, user_b) = (user_a.to_string(), user_b.to_string());

        self.pool.with_connection(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, sender_id, receiver_id, content, is_ai, created_at FROM (
                    SELECT id, sender_id, receiver_id, content, is_ai, created_at, rowid AS seq
                    FROM messages
                    WHERE (sender_id = ?1 AND receiver_id = ?2) OR (sender_id = ?2 AND receiver_id = ?1)
                    ORDER BY created_at DESC, seq DESC
                    LIMIT ?3
                 ) ORDER BY created_at ASC, seq ASC",
            )?;
            let rows = stmt.query_map(params![user_a, user_b, limit as i64], map_message)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        }).await
    }
}
