use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::conversation::{Conversation, ConversationId, Message};
use crate::domain::criteria::Criteria;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conversation not found: {0}")]
    NotFound(String),
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Listing row; full message history is only loaded per conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persistence boundary for conversations. Implementations are keyed by the
/// opaque conversation id; all operations on a missing conversation return
/// [`StoreError::NotFound`] except `get`, which reports absence as `None`.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create(&self, conversation: Conversation) -> Result<(), StoreError>;

    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError>;

    async fn append_message(
        &self,
        id: &ConversationId,
        message: Message,
    ) -> Result<(), StoreError>;

    async fn update_criteria(
        &self,
        id: &ConversationId,
        criteria: &Criteria,
    ) -> Result<(), StoreError>;

    async fn update_title(&self, id: &ConversationId, title: &str) -> Result<(), StoreError>;

    async fn delete(&self, id: &ConversationId) -> Result<(), StoreError>;

    async fn list_all(&self, user_id: &str) -> Result<Vec<ConversationSummary>, StoreError>;

    async fn delete_all(&self, user_id: &str) -> Result<(), StoreError>;
}
