use thiserror::Error;

pub mod conversation;
pub mod course;
pub mod memory;

pub use conversation::SqlConversationStore;
pub use course::{CachedCourseCatalog, SqlCourseCatalog};

use coursey_core::{CatalogError, StoreError};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for StoreError {
    fn from(value: RepositoryError) -> Self {
        StoreError::Backend(value.to_string())
    }
}

impl From<RepositoryError> for CatalogError {
    fn from(value: RepositoryError) -> Self {
        CatalogError::Backend(value.to_string())
    }
}
