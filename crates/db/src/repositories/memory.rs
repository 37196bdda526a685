//! In-memory doubles for tests and local smoke runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;

use coursey_core::{
    CatalogError, Conversation, ConversationId, ConversationStore, ConversationSummary, Course,
    CourseCatalog, Criteria, Message, StoreError,
};

#[derive(Default)]
pub struct InMemoryConversationStore {
    conversations: tokio::sync::Mutex<HashMap<String, Conversation>>,
    failing: bool,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation reports a backend failure, for driving
    /// the persistence-failure paths in tests.
    pub fn failing() -> Self {
        Self { conversations: tokio::sync::Mutex::new(HashMap::new()), failing: true }
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing {
            Err(StoreError::Backend("in-memory store marked failing".to_owned()))
        } else {
            Ok(())
        }
    }

    /// Test helper: current state of one conversation.
    pub async fn snapshot(&self, id: &ConversationId) -> Option<Conversation> {
        self.conversations.lock().await.get(id.as_str()).cloned()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create(&self, conversation: Conversation) -> Result<(), StoreError> {
        self.check()?;
        self.conversations.lock().await.insert(conversation.id.to_string(), conversation);
        Ok(())
    }

    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError> {
        self.check()?;
        Ok(self.conversations.lock().await.get(id.as_str()).cloned())
    }

    async fn append_message(
        &self,
        id: &ConversationId,
        message: Message,
    ) -> Result<(), StoreError> {
        self.check()?;
        let mut conversations = self.conversations.lock().await;
        let conversation = conversations
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        conversation.messages.push(message);
        conversation.updated_at = Utc::now();
        Ok(())
    }

    async fn update_criteria(
        &self,
        id: &ConversationId,
        criteria: &Criteria,
    ) -> Result<(), StoreError> {
        self.check()?;
        let mut conversations = self.conversations.lock().await;
        let conversation = conversations
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        conversation.criteria = criteria.clone();
        conversation.updated_at = Utc::now();
        Ok(())
    }

    async fn update_title(&self, id: &ConversationId, title: &str) -> Result<(), StoreError> {
        self.check()?;
        let mut conversations = self.conversations.lock().await;
        let conversation = conversations
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        conversation.title = title.to_owned();
        conversation.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: &ConversationId) -> Result<(), StoreError> {
        self.check()?;
        self.conversations
            .lock()
            .await
            .remove(id.as_str())
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list_all(&self, user_id: &str) -> Result<Vec<ConversationSummary>, StoreError> {
        self.check()?;
        let conversations = self.conversations.lock().await;
        let mut summaries: Vec<ConversationSummary> = conversations
            .values()
            .filter(|conversation| conversation.user_id == user_id)
            .map(|conversation| ConversationSummary {
                id: conversation.id.clone(),
                title: conversation.title.clone(),
                created_at: conversation.created_at,
                updated_at: conversation.updated_at,
            })
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    async fn delete_all(&self, user_id: &str) -> Result<(), StoreError> {
        self.check()?;
        self.conversations.lock().await.retain(|_, conversation| conversation.user_id != user_id);
        Ok(())
    }
}

pub struct InMemoryCourseCatalog {
    courses: Vec<Course>,
}

impl InMemoryCourseCatalog {
    pub fn new(courses: Vec<Course>) -> Self {
        Self { courses }
    }
}

#[async_trait]
impl CourseCatalog for InMemoryCourseCatalog {
    async fn all_courses(&self) -> Result<Vec<Course>, CatalogError> {
        Ok(self.courses.clone())
    }
}

#[cfg(test)]
mod tests {
    use coursey_core::{Conversation, ConversationId, ConversationStore, Message, StoreError};

    use super::InMemoryConversationStore;

    #[tokio::test]
    async fn append_to_missing_conversation_is_not_found() {
        let store = InMemoryConversationStore::new();
        let result =
            store.append_message(&ConversationId::from("conv_missing"), Message::user("hi")).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn failing_store_reports_backend_errors() {
        let store = InMemoryConversationStore::failing();
        let conversation = Conversation::new(ConversationId::generate(), "student-1");
        let result = store.create(conversation).await;
        assert!(matches!(result, Err(StoreError::Backend(_))));
    }
}
