pub mod catalog;
pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod store;

pub use catalog::{
    match_faculty, match_teacher, CatalogCache, CatalogError, CourseCatalog, Faculty, Teacher,
    FACULTIES, TEACHERS,
};
pub use domain::conversation::{
    derive_title, Conversation, ConversationId, Message, MessageKind, MessageRole,
};
pub use domain::course::{Course, CourseType};
pub use domain::criteria::{Criteria, Difficulty};
pub use domain::reply::{ChatReply, RecommendedCourse, ReplyKind};
pub use engine::{RecommendationEngine, ScoredCourse, MAX_RECOMMENDATIONS};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use store::{ConversationStore, ConversationSummary, StoreError};
