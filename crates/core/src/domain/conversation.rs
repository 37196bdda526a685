use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::criteria::Criteria;
use crate::domain::reply::RecommendedCourse;

/// Conversation titles are derived from the first user message and clipped to
/// this many characters.
pub const MAX_TITLE_CHARS: usize = 20;

const UNTITLED: &str = "新对话";

/// Opaque conversation identifier. Callers may bring their own; generated ids
/// only need uniqueness.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn generate() -> Self {
        Self(format!("conv_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Recommendation,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Recommendation => "recommendation",
        }
    }
}

/// One chat message. Immutable once appended; display order is append order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub courses: Vec<RecommendedCourse>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn next_id() -> String {
        format!("msg_{}", Uuid::new_v4().simple())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Self::next_id(),
            role: MessageRole::User,
            content: content.into(),
            kind: MessageKind::Text,
            courses: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn assistant_text(content: impl Into<String>) -> Self {
        Self {
            id: Self::next_id(),
            role: MessageRole::Assistant,
            content: content.into(),
            kind: MessageKind::Text,
            courses: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn recommendation(content: impl Into<String>, courses: Vec<RecommendedCourse>) -> Self {
        Self {
            id: Self::next_id(),
            role: MessageRole::Assistant,
            content: content.into(),
            kind: MessageKind::Recommendation,
            courses,
            created_at: Utc::now(),
        }
    }
}

/// A conversation owns its message list and its accumulated criteria; the
/// criteria value is replaced wholesale on each merge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    pub user_id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub criteria: Criteria,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(id: ConversationId, user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id: user_id.into(),
            title: UNTITLED.to_owned(),
            messages: Vec::new(),
            criteria: Criteria::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// True until the first user message lands, i.e. while the title is still
    /// the placeholder.
    pub fn is_untitled(&self) -> bool {
        self.title == UNTITLED
    }

    pub fn user_message_count(&self) -> usize {
        self.messages.iter().filter(|message| message.role == MessageRole::User).count()
    }
}

/// Clips the first user message into a conversation title.
pub fn derive_title(first_message: &str) -> String {
    let trimmed = first_message.trim();
    if trimmed.is_empty() {
        return UNTITLED.to_owned();
    }

    let clipped: String = trimmed.chars().take(MAX_TITLE_CHARS).collect();
    if clipped.chars().count() < trimmed.chars().count() {
        format!("{clipped}...")
    } else {
        clipped
    }
}
