//! Closed faculty/teacher directory and the course catalog boundary.
//!
//! The directory is a fixed data set: the deterministic extractor matches
//! utterances against it, and the LLM prompts enumerate it so the service can
//! only ever answer with names that exist. The catalog itself lives behind
//! the [`CourseCatalog`] trait; the engine consumes whatever the catalog
//! returns as its full candidate set and performs no querying of its own.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::domain::course::Course;

/// A faculty and the loose concept words that map onto it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Faculty {
    pub name: &'static str,
    pub concepts: &'static [&'static str],
}

/// A teacher in the closed directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Teacher {
    pub name: &'static str,
    pub faculty: &'static str,
    pub title: &'static str,
    pub specialty: &'static str,
}

pub const FACULTIES: &[Faculty] = &[
    Faculty {
        name: "创新工程学院",
        concepts: &["计算机", "软件", "编程", "IT", "人工智能", "AI", "算法", "数据结构", "数据库"],
    },
    Faculty { name: "商学院", concepts: &["经济", "金融", "会计", "管理", "营销", "投资", "商业"] },
    Faculty {
        name: "人文艺术学院",
        concepts: &["艺术", "设计", "文化", "写作", "媒体", "创意"],
    },
    Faculty { name: "酒店与旅游管理学院", concepts: &["酒店", "旅游", "会展", "餐饮", "服务"] },
    Faculty { name: "医学院", concepts: &["医学", "医疗", "临床", "药理", "解剖", "生理", "健康"] },
];

pub const TEACHERS: &[Teacher] = &[
    Teacher { name: "陈伟", faculty: "创新工程学院", title: "教授", specialty: "人工智能与机器学习专家" },
    Teacher { name: "林晓明", faculty: "创新工程学院", title: "副教授", specialty: "软件工程与系统架构专家" },
    Teacher { name: "黄建华", faculty: "商学院", title: "教授", specialty: "财务管理与投资分析专家" },
    Teacher { name: "周梅", faculty: "商学院", title: "副教授", specialty: "市场营销策略专家" },
    Teacher { name: "王艺琳", faculty: "人文艺术学院", title: "教授", specialty: "设计与艺术评论家" },
    Teacher { name: "刘芳", faculty: "人文艺术学院", title: "副教授", specialty: "文化研究与创意写作专家" },
    Teacher { name: "张红", faculty: "酒店与旅游管理学院", title: "教授", specialty: "酒店管理专家" },
    Teacher { name: "李强", faculty: "酒店与旅游管理学院", title: "副教授", specialty: "旅游经济学专家" },
    Teacher { name: "赵明德", faculty: "医学院", title: "教授", specialty: "内科主任医师" },
    Teacher { name: "孙丽丽", faculty: "医学院", title: "副教授", specialty: "临床药理学专家" },
];

/// First faculty whose name appears verbatim in the text. Case-sensitive on
/// purpose: directory names are proper nouns.
pub fn match_faculty(text: &str) -> Option<&'static Faculty> {
    FACULTIES.iter().find(|faculty| text.contains(faculty.name))
}

/// First teacher whose name appears verbatim in the text.
pub fn match_teacher(text: &str) -> Option<&'static Teacher> {
    TEACHERS.iter().find(|teacher| text.contains(teacher.name))
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog backend error: {0}")]
    Backend(String),
}

/// Read side of the external course catalog.
#[async_trait]
pub trait CourseCatalog: Send + Sync {
    async fn all_courses(&self) -> Result<Vec<Course>, CatalogError>;
}

/// Explicit cache value object for catalog snapshots. Freshness is a plain
/// timestamp comparison against the TTL; staleness and invalidation are both
/// observable, never hidden module state.
#[derive(Clone, Debug)]
pub struct CatalogCache {
    courses: Vec<Course>,
    loaded_at: Option<DateTime<Utc>>,
    ttl: Duration,
}

impl CatalogCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            courses: Vec::new(),
            loaded_at: None,
            ttl: Duration::seconds(ttl_secs.min(i64::MAX as u64) as i64),
        }
    }

    pub fn fill(&mut self, courses: Vec<Course>, now: DateTime<Utc>) {
        self.courses = courses;
        self.loaded_at = Some(now);
    }

    pub fn invalidate(&mut self) {
        self.courses.clear();
        self.loaded_at = None;
    }

    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match self.loaded_at {
            Some(loaded_at) => now - loaded_at >= self.ttl,
            None => true,
        }
    }

    /// The cached snapshot, or `None` when it has expired.
    pub fn get(&self, now: DateTime<Utc>) -> Option<&[Course]> {
        if self.is_stale(now) {
            None
        } else {
            Some(&self.courses)
        }
    }
}
