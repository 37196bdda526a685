//! Criteria extraction strategies.
//!
//! Both strategies produce the same [`Extraction`] shape. The deterministic
//! one scans for fixed trigger substrings and the closed directory lists; it
//! never fails and is the mandatory fallback. The LLM-backed one adds fuzzy
//! concept-to-faculty mapping and keyword extraction, and fails with
//! [`ExtractionError::ServiceUnavailable`] whenever the upstream response is
//! missing or does not parse into the expected shape - a malformed response
//! is never silently treated as empty criteria.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use coursey_core::{match_faculty, match_teacher, CourseType, Criteria, Difficulty};

use crate::llm::{ChatRequest, LlmClient, LlmError};
use crate::prompts;

const EXTRACTION_TEMPERATURE: f64 = 0.3;
const EXTRACTION_MAX_TOKENS: u32 = 500;

const COMPULSORY_TRIGGERS: &[&str] = &["必修", "compulsory", "required course"];
const ELECTIVE_TRIGGERS: &[&str] = &["选修", "elective", "optional course"];
const EASY_TRIGGERS: &[&str] = &["简单", "容易", "轻松", "easy"];
const HARD_TRIGGERS: &[&str] = &["难", "挑战", "hard", "challenging"];
const CREDIT_MARKERS_CJK: &[&str] = &["学分"];

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("extraction service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<LlmError> for ExtractionError {
    fn from(value: LlmError) -> Self {
        match value {
            LlmError::Unavailable(reason) => Self::ServiceUnavailable(reason),
        }
    }
}

/// Result of one extraction pass. The delta only carries fields the
/// utterance actually set; merging with prior context is the orchestrator's
/// job. `need_more_info` is informational - the pipeline always attempts a
/// recommendation regardless.
#[derive(Clone, Debug, PartialEq)]
pub struct Extraction {
    pub delta: Criteria,
    pub confidence: f64,
    pub need_more_info: bool,
    pub clarifying_question: Option<String>,
}

#[async_trait]
pub trait CriteriaExtractor: Send + Sync {
    async fn extract(
        &self,
        utterance: &str,
        prior: &Criteria,
    ) -> Result<Extraction, ExtractionError>;
}

/// Trigger-substring extractor. No external dependency, total.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicExtractor;

impl DeterministicExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_sync(&self, utterance: &str) -> Extraction {
        let lowered = utterance.to_lowercase();
        let mut delta = Criteria::default();

        if COMPULSORY_TRIGGERS.iter().any(|trigger| lowered.contains(trigger)) {
            delta.course_type = Some(CourseType::Compulsory);
        } else if ELECTIVE_TRIGGERS.iter().any(|trigger| lowered.contains(trigger)) {
            delta.course_type = Some(CourseType::Elective);
        }

        delta.credits = extract_credits(utterance, &lowered);

        if EASY_TRIGGERS.iter().any(|trigger| lowered.contains(trigger)) {
            delta.difficulty = Some(Difficulty::Easy);
        } else if HARD_TRIGGERS.iter().any(|trigger| lowered.contains(trigger)) {
            delta.difficulty = Some(Difficulty::Hard);
        }

        // Directory names are proper nouns; matching stays case-sensitive on
        // the original utterance.
        delta.faculty = match_faculty(utterance).map(|faculty| faculty.name.to_owned());
        delta.teacher = match_teacher(utterance).map(|teacher| teacher.name.to_owned());

        let confidence = confidence_for(&delta);
        let need_more_info = delta.is_empty();
        let clarifying_question = need_more_info.then(|| {
            "可以告诉我您感兴趣的学院、课程类型或方向吗？我会为您推荐合适的课程。".to_owned()
        });

        Extraction { delta, confidence, need_more_info, clarifying_question }
    }
}

#[async_trait]
impl CriteriaExtractor for DeterministicExtractor {
    async fn extract(
        &self,
        utterance: &str,
        _prior: &Criteria,
    ) -> Result<Extraction, ExtractionError> {
        Ok(self.extract_sync(utterance))
    }
}

/// First integer adjacent to a credits-unit marker, in either script:
/// `3学分` / `3 学分` / `3 credits`.
fn extract_credits(utterance: &str, lowered: &str) -> Option<f64> {
    for marker in CREDIT_MARKERS_CJK {
        if let Some(index) = utterance.find(marker) {
            let prefix = utterance[..index].trim_end();
            let digits: String = prefix
                .chars()
                .rev()
                .take_while(char::is_ascii_digit)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            if !digits.is_empty() {
                return digits.parse().ok();
            }
        }
    }

    let tokens: Vec<&str> = lowered.split_whitespace().collect();
    for window in tokens.windows(2) {
        if let [value, unit] = window {
            if unit.starts_with("credit") {
                if let Ok(credits) = value.parse::<f64>() {
                    return Some(credits);
                }
            }
        }
    }

    None
}

fn confidence_for(delta: &Criteria) -> f64 {
    let mut confidence: f64 = 0.2;
    if delta.course_type.is_some() {
        confidence += 0.15;
    }
    if delta.credits.is_some() {
        confidence += 0.15;
    }
    if delta.difficulty.is_some() {
        confidence += 0.1;
    }
    if delta.faculty.is_some() {
        confidence += 0.2;
    }
    if delta.teacher.is_some() {
        confidence += 0.2;
    }
    confidence.min(0.95)
}

/// Raw wire shape of the intent-parser response. Field-level oddities are
/// tolerated and validated below; a shape-level mismatch fails the whole
/// parse and so the whole strategy.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIntentResponse {
    #[serde(default)]
    parameters: Option<RawParameters>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    need_more_info: Option<bool>,
    #[serde(default)]
    next_question: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawParameters {
    #[serde(default)]
    course_type: Option<serde_json::Value>,
    #[serde(default)]
    credits: Option<serde_json::Value>,
    #[serde(default)]
    keywords: Option<Vec<String>>,
    #[serde(default)]
    difficulty: Option<serde_json::Value>,
    #[serde(default)]
    faculty: Option<String>,
    #[serde(default)]
    teacher: Option<String>,
}

/// LLM-backed extractor. Higher recall than the deterministic strategy
/// (fuzzy concept mapping, keyword extraction), but requires the external
/// service.
pub struct LlmExtractor {
    client: Arc<dyn LlmClient>,
}

impl LlmExtractor {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    fn convert(&self, raw: RawIntentResponse) -> Extraction {
        let parameters = raw.parameters.unwrap_or_default();
        let mut delta = Criteria::default();

        if let Some(value) = parameters.course_type {
            match value.as_str().and_then(CourseType::parse) {
                Some(course_type) => delta.course_type = Some(course_type),
                None => {
                    if !value.is_null() {
                        warn!(field = "courseType", %value, "dropping invalid extractor field");
                    }
                }
            }
        }

        if let Some(value) = parameters.credits {
            let credits = value.as_f64().or_else(|| value.as_str().and_then(|s| s.parse().ok()));
            match credits {
                Some(credits) => delta.credits = Some(credits),
                None => {
                    if !value.is_null() {
                        warn!(field = "credits", %value, "dropping invalid extractor field");
                    }
                }
            }
        }

        for keyword in parameters.keywords.unwrap_or_default() {
            delta.add_keyword(keyword);
        }

        if let Some(value) = parameters.difficulty {
            match value.as_str().and_then(Difficulty::parse) {
                Some(difficulty) => delta.difficulty = Some(difficulty),
                None => {
                    if !value.is_null() {
                        warn!(field = "difficulty", %value, "dropping invalid extractor field");
                    }
                }
            }
        }

        // Faculty/teacher must come from the closed directory; anything else
        // is dropped rather than passed through to filtering.
        if let Some(value) = parameters.faculty {
            match match_faculty(&value) {
                Some(faculty) => delta.faculty = Some(faculty.name.to_owned()),
                None => warn!(field = "faculty", %value, "dropping name outside the directory"),
            }
        }
        if let Some(value) = parameters.teacher {
            match match_teacher(&value) {
                Some(teacher) => delta.teacher = Some(teacher.name.to_owned()),
                None => warn!(field = "teacher", %value, "dropping name outside the directory"),
            }
        }

        for dropped in delta.sanitize() {
            warn!(%dropped, "dropping invalid extractor field");
        }

        Extraction {
            confidence: raw.confidence.unwrap_or(0.8).clamp(0.0, 1.0),
            need_more_info: raw.need_more_info.unwrap_or(false),
            clarifying_question: raw.next_question.filter(|question| !question.trim().is_empty()),
            delta,
        }
    }
}

#[async_trait]
impl CriteriaExtractor for LlmExtractor {
    async fn extract(
        &self,
        utterance: &str,
        prior: &Criteria,
    ) -> Result<Extraction, ExtractionError> {
        let request = ChatRequest {
            system: prompts::intent_system_prompt(),
            user: prompts::intent_user_prompt(utterance, prior),
            temperature: EXTRACTION_TEMPERATURE,
            max_tokens: EXTRACTION_MAX_TOKENS,
            json_output: true,
        };

        let content = self.client.complete(&request).await?;
        let raw: RawIntentResponse = serde_json::from_str(&content).map_err(|error| {
            ExtractionError::ServiceUnavailable(format!("unparseable intent response: {error}"))
        })?;

        Ok(self.convert(raw))
    }
}
