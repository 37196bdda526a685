use serde::{Deserialize, Serialize};

use crate::domain::course::CourseType;
use crate::domain::criteria::Criteria;
use crate::engine::ScoredCourse;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyKind {
    Text,
    Recommendation,
}

/// Course snapshot carried inside recommendation messages and replies, so
/// history replays without re-querying the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedCourse {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub credits: f64,
    #[serde(rename = "type")]
    pub course_type: CourseType,
    pub faculty_name: String,
    pub teacher_name: String,
    #[serde(default)]
    pub description: String,
    pub average_rating: Option<f64>,
    pub review_count: Option<u32>,
    pub reason: String,
}

impl From<&ScoredCourse> for RecommendedCourse {
    fn from(scored: &ScoredCourse) -> Self {
        Self {
            id: scored.course.id,
            code: scored.course.code.clone(),
            name: scored.course.name.clone(),
            credits: scored.course.credits,
            course_type: scored.course.course_type,
            faculty_name: scored.course.faculty_name.clone(),
            teacher_name: scored.course.teacher_name.clone(),
            description: scored.course.description.clone(),
            average_rating: scored.course.average_rating,
            review_count: scored.course.review_count,
            reason: scored.reason.clone(),
        }
    }
}

/// Shape handed back to the presentation layer after each turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    #[serde(rename = "type")]
    pub kind: ReplyKind,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub courses: Option<Vec<RecommendedCourse>>,
    pub updated_context: Criteria,
}

impl ChatReply {
    pub fn text(content: impl Into<String>, updated_context: Criteria) -> Self {
        Self { kind: ReplyKind::Text, content: content.into(), courses: None, updated_context }
    }

    pub fn recommendation(
        content: impl Into<String>,
        courses: Vec<RecommendedCourse>,
        updated_context: Criteria,
    ) -> Self {
        Self {
            kind: ReplyKind::Recommendation,
            content: content.into(),
            courses: Some(courses),
            updated_context,
        }
    }
}
