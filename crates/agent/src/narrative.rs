//! Reply narration strategies.
//!
//! Both strategies return the same three-field [`Narrative`]: a greeting, a
//! reason per recommended course, and an optional follow-up suggestion. The
//! template strategy composes them from the engine's own reason strings and
//! never fails; the LLM strategy rephrases for warmth and fails with
//! [`NarrationError::ServiceUnavailable`] under exactly the conditions the
//! extractor does.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use coursey_core::engine::ScoredCourse;
use coursey_core::Criteria;

use crate::llm::{ChatRequest, LlmClient, LlmError};
use crate::prompts;

const NARRATION_TEMPERATURE: f64 = 0.7;
const NARRATION_MAX_TOKENS: u32 = 800;

const DEFAULT_GREETING: &str = "根据您的需求，我为您推荐以下课程：";

#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("narration service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<LlmError> for NarrationError {
    fn from(value: LlmError) -> Self {
        match value {
            LlmError::Unavailable(reason) => Self::ServiceUnavailable(reason),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CourseReason {
    pub course_id: i64,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Narrative {
    pub greeting: String,
    pub reasons: Vec<CourseReason>,
    pub suggestion: String,
}

impl Narrative {
    /// Reason for one course, if the narrative carries one.
    pub fn reason_for(&self, course_id: i64) -> Option<&str> {
        self.reasons
            .iter()
            .find(|reason| reason.course_id == course_id)
            .map(|reason| reason.reason.as_str())
    }
}

#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(
        &self,
        criteria: &Criteria,
        courses: &[ScoredCourse],
    ) -> Result<Narrative, NarrationError>;
}

/// Deterministic fallback: fixed greeting, engine reasons, no suggestion.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateNarrator;

impl TemplateNarrator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NarrativeGenerator for TemplateNarrator {
    async fn generate(
        &self,
        _criteria: &Criteria,
        courses: &[ScoredCourse],
    ) -> Result<Narrative, NarrationError> {
        Ok(Narrative {
            greeting: DEFAULT_GREETING.to_owned(),
            reasons: courses
                .iter()
                .map(|scored| CourseReason {
                    course_id: scored.course.id,
                    reason: scored.reason.clone(),
                })
                .collect(),
            suggestion: String::new(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawNarrativeResponse {
    #[serde(default)]
    greeting: Option<String>,
    #[serde(default)]
    courses: Option<Vec<RawCourseReason>>,
    #[serde(default)]
    suggestion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCourseReason {
    #[serde(alias = "courseId")]
    course_id: Option<i64>,
    reason: Option<String>,
}

/// LLM-backed narrator. Courses the service skips keep their engine reason.
pub struct LlmNarrator {
    client: Arc<dyn LlmClient>,
}

impl LlmNarrator {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NarrativeGenerator for LlmNarrator {
    async fn generate(
        &self,
        criteria: &Criteria,
        courses: &[ScoredCourse],
    ) -> Result<Narrative, NarrationError> {
        let request = ChatRequest {
            system: prompts::narrative_system_prompt(),
            user: prompts::narrative_user_prompt(criteria, courses),
            temperature: NARRATION_TEMPERATURE,
            max_tokens: NARRATION_MAX_TOKENS,
            json_output: true,
        };

        let content = self.client.complete(&request).await?;
        let raw: RawNarrativeResponse = serde_json::from_str(&content).map_err(|error| {
            NarrationError::ServiceUnavailable(format!("unparseable narrative response: {error}"))
        })?;

        let generated: Vec<CourseReason> = raw
            .courses
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| match (entry.course_id, entry.reason) {
                (Some(course_id), Some(reason)) if !reason.trim().is_empty() => {
                    Some(CourseReason { course_id, reason })
                }
                _ => None,
            })
            .collect();

        let reasons = courses
            .iter()
            .map(|scored| CourseReason {
                course_id: scored.course.id,
                reason: generated
                    .iter()
                    .find(|reason| reason.course_id == scored.course.id)
                    .map(|reason| reason.reason.clone())
                    .unwrap_or_else(|| scored.reason.clone()),
            })
            .collect();

        Ok(Narrative {
            greeting: raw
                .greeting
                .filter(|greeting| !greeting.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_GREETING.to_owned()),
            reasons,
            suggestion: raw.suggestion.unwrap_or_default(),
        })
    }
}
