use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use tracing::debug;

use coursey_core::{CatalogCache, CatalogError, Course, CourseCatalog, CourseType};

use super::RepositoryError;
use crate::DbPool;

pub struct SqlCourseCatalog {
    pool: DbPool,
}

impl SqlCourseCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode_course_type(raw: &str) -> Result<CourseType, RepositoryError> {
    CourseType::parse(raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown course type `{raw}`")))
}

#[async_trait]
impl CourseCatalog for SqlCourseCatalog {
    async fn all_courses(&self) -> Result<Vec<Course>, CatalogError> {
        let rows = sqlx::query(
            "SELECT id, code, name, credits, course_type, faculty_name, teacher_name, \
             description, average_rating, review_count \
             FROM courses ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        let mut courses = Vec::with_capacity(rows.len());
        for row in rows {
            courses.push(Course {
                id: row.get("id"),
                code: row.get("code"),
                name: row.get("name"),
                credits: row.get("credits"),
                course_type: decode_course_type(&row.get::<String, _>("course_type"))?,
                faculty_name: row.get("faculty_name"),
                teacher_name: row.get("teacher_name"),
                description: row.get("description"),
                average_rating: row.get("average_rating"),
                review_count: row.get::<Option<i64>, _>("review_count").map(|count| count as u32),
            });
        }
        Ok(courses)
    }
}

/// Catalog wrapper owning an explicit [`CatalogCache`]. Freshness is a TTL
/// timestamp comparison; `invalidate` forces the next read through to the
/// backing catalog.
pub struct CachedCourseCatalog {
    inner: Arc<dyn CourseCatalog>,
    cache: tokio::sync::RwLock<CatalogCache>,
}

impl CachedCourseCatalog {
    pub fn new(inner: Arc<dyn CourseCatalog>, ttl_secs: u64) -> Self {
        Self { inner, cache: tokio::sync::RwLock::new(CatalogCache::new(ttl_secs)) }
    }

    pub async fn invalidate(&self) {
        self.cache.write().await.invalidate();
    }
}

#[async_trait]
impl CourseCatalog for CachedCourseCatalog {
    async fn all_courses(&self) -> Result<Vec<Course>, CatalogError> {
        let now = Utc::now();
        if let Some(courses) = self.cache.read().await.get(now) {
            return Ok(courses.to_vec());
        }

        let courses = self.inner.all_courses().await?;
        debug!(count = courses.len(), "catalog cache refreshed");
        self.cache.write().await.fill(courses.clone(), now);
        Ok(courses)
    }
}
