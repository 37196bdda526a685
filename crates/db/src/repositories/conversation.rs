use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use coursey_core::{
    Conversation, ConversationId, ConversationStore, ConversationSummary, Criteria, Message,
    MessageKind, MessageRole, RecommendedCourse, StoreError,
};

use super::RepositoryError;
use crate::DbPool;

pub struct SqlConversationStore {
    pool: DbPool,
}

impl SqlConversationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn touch(&self, id: &ConversationId, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result =
            sqlx::query("UPDATE conversations SET updated_at = ? WHERE conversation_id = ?")
                .bind(now)
                .bind(id.as_str())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}

fn decode_role(raw: &str) -> Result<MessageRole, RepositoryError> {
    match raw {
        "user" => Ok(MessageRole::User),
        "assistant" => Ok(MessageRole::Assistant),
        other => Err(RepositoryError::Decode(format!("unknown message role `{other}`"))),
    }
}

fn decode_kind(raw: &str) -> Result<MessageKind, RepositoryError> {
    match raw {
        "text" => Ok(MessageKind::Text),
        "recommendation" => Ok(MessageKind::Recommendation),
        other => Err(RepositoryError::Decode(format!("unknown message kind `{other}`"))),
    }
}

fn decode_criteria(raw: &str) -> Result<Criteria, RepositoryError> {
    serde_json::from_str(raw)
        .map_err(|error| RepositoryError::Decode(format!("criteria column: {error}")))
}

fn decode_courses(raw: Option<String>) -> Result<Vec<RecommendedCourse>, RepositoryError> {
    match raw {
        Some(json) if !json.trim().is_empty() => serde_json::from_str(&json)
            .map_err(|error| RepositoryError::Decode(format!("courses column: {error}"))),
        _ => Ok(Vec::new()),
    }
}

fn encode_json<T: serde::Serialize>(value: &T, column: &str) -> Result<String, RepositoryError> {
    serde_json::to_string(value)
        .map_err(|error| RepositoryError::Decode(format!("{column} column: {error}")))
}

async fn fetch_messages(
    pool: &DbPool,
    id: &ConversationId,
) -> Result<Vec<Message>, RepositoryError> {
    let rows = sqlx::query(
        "SELECT message_id, role, content, kind, courses, created_at \
         FROM messages WHERE conversation_id = ? ORDER BY created_at ASC, rowid ASC",
    )
    .bind(id.as_str())
    .fetch_all(pool)
    .await?;

    let mut messages = Vec::with_capacity(rows.len());
    for row in rows {
        messages.push(Message {
            id: row.get("message_id"),
            role: decode_role(&row.get::<String, _>("role"))?,
            content: row.get("content"),
            kind: decode_kind(&row.get::<String, _>("kind"))?,
            courses: decode_courses(row.get("courses"))?,
            created_at: row.get("created_at"),
        });
    }
    Ok(messages)
}

#[async_trait]
impl ConversationStore for SqlConversationStore {
    async fn create(&self, conversation: Conversation) -> Result<(), StoreError> {
        let criteria = encode_json(&conversation.criteria, "criteria")?;
        sqlx::query(
            "INSERT INTO conversations \
             (conversation_id, user_id, title, criteria, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(conversation.id.as_str())
        .bind(&conversation.user_id)
        .bind(&conversation.title)
        .bind(criteria)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        for message in conversation.messages {
            self.append_message(&conversation.id, message).await?;
        }
        Ok(())
    }

    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query(
            "SELECT conversation_id, user_id, title, criteria, created_at, updated_at \
             FROM conversations WHERE conversation_id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let conversation = Conversation {
            id: ConversationId(row.get("conversation_id")),
            user_id: row.get("user_id"),
            title: row.get("title"),
            criteria: decode_criteria(&row.get::<String, _>("criteria"))?,
            messages: fetch_messages(&self.pool, id).await?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        };
        Ok(Some(conversation))
    }

    async fn append_message(
        &self,
        id: &ConversationId,
        message: Message,
    ) -> Result<(), StoreError> {
        let touched = self.touch(id, Utc::now()).await?;
        if touched == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        let courses = if message.courses.is_empty() {
            None
        } else {
            Some(encode_json(&message.courses, "courses")?)
        };

        sqlx::query(
            "INSERT INTO messages \
             (message_id, conversation_id, role, content, kind, courses, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(id.as_str())
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.kind.as_str())
        .bind(courses)
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;
        Ok(())
    }

    async fn update_criteria(
        &self,
        id: &ConversationId,
        criteria: &Criteria,
    ) -> Result<(), StoreError> {
        let encoded = encode_json(criteria, "criteria")?;
        let result = sqlx::query(
            "UPDATE conversations SET criteria = ?, updated_at = ? WHERE conversation_id = ?",
        )
        .bind(encoded)
        .bind(Utc::now())
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn update_title(&self, id: &ConversationId, title: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE conversations SET title = ?, updated_at = ? WHERE conversation_id = ?",
        )
        .bind(title)
        .bind(Utc::now())
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: &ConversationId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM conversations WHERE conversation_id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list_all(&self, user_id: &str) -> Result<Vec<ConversationSummary>, StoreError> {
        let rows = sqlx::query(
            "SELECT conversation_id, title, created_at, updated_at \
             FROM conversations WHERE user_id = ? ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| ConversationSummary {
                id: ConversationId(row.get("conversation_id")),
                title: row.get("title"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            })
            .collect())
    }

    async fn delete_all(&self, user_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM conversations WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(())
    }
}
