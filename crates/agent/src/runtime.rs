//! Conversation orchestration.
//!
//! One `submit_turn` call drives the whole pipeline: ensure the conversation
//! exists, append the user message, extract, merge, recommend, narrate,
//! append the assistant message with the updated criteria, reply. Extractor
//! and narrator unavailability degrade to the deterministic strategies; only
//! store failures abort a turn.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use coursey_core::{
    derive_title, ApplicationError, CatalogError, ChatReply, Conversation, ConversationId,
    CourseCatalog, ConversationStore, Criteria, Message, RecommendationEngine, RecommendedCourse,
    StoreError,
};

use crate::extract::{CriteriaExtractor, DeterministicExtractor, Extraction, LlmExtractor};
use crate::llm::LlmClient;
use crate::narrative::{LlmNarrator, Narrative, NarrativeGenerator, TemplateNarrator};

const EMPTY_CATALOG_REPLY: &str =
    "抱歉，课程目录暂时为空，请稍后再试或联系管理员。";

/// Availability snapshot for the status endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeStatus {
    pub llm_available: bool,
    pub mode: &'static str,
}

/// Result of one turn.
#[derive(Clone, Debug)]
pub struct TurnOutcome {
    pub conversation_id: ConversationId,
    pub reply: ChatReply,
}

pub struct ChatRuntime {
    store: Arc<dyn ConversationStore>,
    catalog: Arc<dyn CourseCatalog>,
    engine: RecommendationEngine,
    llm_extractor: Option<LlmExtractor>,
    llm_narrator: Option<LlmNarrator>,
    fallback_extractor: DeterministicExtractor,
    fallback_narrator: TemplateNarrator,
    // One guard per conversation id: concurrent submissions against the same
    // conversation must serialize so no criteria merge is lost.
    turn_guards: tokio::sync::Mutex<HashMap<ConversationId, Arc<tokio::sync::Mutex<()>>>>,
}

impl ChatRuntime {
    /// Builds a runtime. When `llm_client` is `None` (service disabled or
    /// unconfigured), the deterministic strategies run alone.
    pub fn new(
        store: Arc<dyn ConversationStore>,
        catalog: Arc<dyn CourseCatalog>,
        llm_client: Option<Arc<dyn LlmClient>>,
    ) -> Self {
        Self {
            store,
            catalog,
            engine: RecommendationEngine::new(),
            llm_extractor: llm_client.clone().map(LlmExtractor::new),
            llm_narrator: llm_client.map(LlmNarrator::new),
            fallback_extractor: DeterministicExtractor::new(),
            fallback_narrator: TemplateNarrator::new(),
            turn_guards: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn status(&self) -> RuntimeStatus {
        let llm_available = self.llm_extractor.is_some();
        RuntimeStatus {
            llm_available,
            mode: if llm_available { "AI增强模式" } else { "规则模式" },
        }
    }

    /// Submits one user utterance to a conversation, creating the
    /// conversation when `conversation_id` is `None`.
    pub async fn submit_turn(
        &self,
        user_id: &str,
        conversation_id: Option<ConversationId>,
        utterance: &str,
    ) -> Result<TurnOutcome, ApplicationError> {
        let conversation_id = conversation_id.unwrap_or_else(ConversationId::generate);
        let guard = self.turn_guard(&conversation_id).await;
        let _turn = guard.lock().await;

        let conversation = self.ensure_conversation(&conversation_id, user_id).await?;
        let is_first_user_message = conversation.user_message_count() == 0;

        // The user message lands before extraction so it survives any later
        // failure in the turn.
        self.store
            .append_message(&conversation_id, Message::user(utterance))
            .await
            .map_err(persistence)?;

        if is_first_user_message && conversation.is_untitled() {
            let title = derive_title(utterance);
            self.store.update_title(&conversation_id, &title).await.map_err(persistence)?;
        }

        let prior = conversation.criteria;
        let extraction = self.extract_with_fallback(utterance, &prior).await;
        let merged = prior.merged_with(&extraction.delta);

        let catalog = self.catalog.all_courses().await.map_err(catalog_failure)?;
        let ranked = self.engine.recommend(&merged, &catalog);

        let (message, reply) = if ranked.is_empty() {
            let content = extraction
                .clarifying_question
                .clone()
                .unwrap_or_else(|| EMPTY_CATALOG_REPLY.to_owned());
            (Message::assistant_text(content.clone()), ChatReply::text(content, merged.clone()))
        } else {
            let narrative = self.narrate_with_fallback(&merged, &ranked).await;
            let content = compose_content(&narrative);
            let courses: Vec<RecommendedCourse> = ranked
                .iter()
                .map(|scored| {
                    let mut course = RecommendedCourse::from(scored);
                    if let Some(reason) = narrative.reason_for(scored.course.id) {
                        course.reason = reason.to_owned();
                    }
                    course
                })
                .collect();
            (
                Message::recommendation(content.clone(), courses.clone()),
                ChatReply::recommendation(content, courses, merged.clone()),
            )
        };

        // Assistant message and criteria persist together under the turn
        // guard; a concurrent turn sees either both or neither.
        self.store.append_message(&conversation_id, message).await.map_err(persistence)?;
        self.store.update_criteria(&conversation_id, &merged).await.map_err(persistence)?;

        info!(
            event_name = "chat.turn.completed",
            conversation_id = %conversation_id,
            results = reply.courses.as_ref().map(Vec::len).unwrap_or(0),
            "turn completed"
        );

        Ok(TurnOutcome { conversation_id, reply })
    }

    async fn ensure_conversation(
        &self,
        id: &ConversationId,
        user_id: &str,
    ) -> Result<Conversation, ApplicationError> {
        if let Some(existing) = self.store.get(id).await.map_err(persistence)? {
            return Ok(existing);
        }

        let conversation = Conversation::new(id.clone(), user_id);
        self.store.create(conversation.clone()).await.map_err(persistence)?;
        info!(
            event_name = "chat.conversation.created",
            conversation_id = %id,
            "conversation created"
        );
        Ok(conversation)
    }

    /// LLM strategy first when configured; any failure degrades to the
    /// deterministic extractor rather than aborting the turn.
    async fn extract_with_fallback(&self, utterance: &str, prior: &Criteria) -> Extraction {
        if let Some(extractor) = &self.llm_extractor {
            match extractor.extract(utterance, prior).await {
                Ok(extraction) => return extraction,
                Err(error) => {
                    warn!(
                        event_name = "chat.extraction.degraded",
                        %error,
                        "llm extraction failed, using deterministic extractor"
                    );
                }
            }
        }

        match self.fallback_extractor.extract(utterance, prior).await {
            Ok(extraction) => extraction,
            // Unreachable: the deterministic strategy is total.
            Err(_) => Extraction {
                delta: Criteria::default(),
                confidence: 0.0,
                need_more_info: true,
                clarifying_question: None,
            },
        }
    }

    async fn narrate_with_fallback(
        &self,
        criteria: &Criteria,
        ranked: &[coursey_core::ScoredCourse],
    ) -> Narrative {
        if let Some(narrator) = &self.llm_narrator {
            match narrator.generate(criteria, ranked).await {
                Ok(narrative) => return narrative,
                Err(error) => {
                    warn!(
                        event_name = "chat.narration.degraded",
                        %error,
                        "llm narration failed, using template narrator"
                    );
                }
            }
        }

        match self.fallback_narrator.generate(criteria, ranked).await {
            Ok(narrative) => narrative,
            // Unreachable: the template strategy is total.
            Err(_) => Narrative {
                greeting: String::new(),
                reasons: Vec::new(),
                suggestion: String::new(),
            },
        }
    }

    async fn turn_guard(&self, id: &ConversationId) -> Arc<tokio::sync::Mutex<()>> {
        let mut guards = self.turn_guards.lock().await;
        guards.entry(id.clone()).or_default().clone()
    }
}

fn persistence(error: StoreError) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}

fn catalog_failure(error: CatalogError) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}

fn compose_content(narrative: &Narrative) -> String {
    if narrative.suggestion.trim().is_empty() {
        narrative.greeting.clone()
    } else {
        format!("{}\n\n{}", narrative.greeting, narrative.suggestion)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use coursey_core::{Course, CourseType, ConversationId, Difficulty, ReplyKind};
    use coursey_db::repositories::memory::{InMemoryConversationStore, InMemoryCourseCatalog};

    use super::ChatRuntime;
    use crate::llm::{ChatRequest, LlmClient, LlmError};

    struct FailingClient;

    #[async_trait]
    impl LlmClient for FailingClient {
        async fn complete(&self, _request: &ChatRequest) -> Result<String, LlmError> {
            Err(LlmError::Unavailable("request timed out".to_owned()))
        }
    }

    fn course(id: i64, name: &str, course_type: CourseType, credits: f64) -> Course {
        Course {
            id,
            code: format!("C{id:03}"),
            name: name.to_owned(),
            credits,
            course_type,
            faculty_name: "创新工程学院".to_owned(),
            teacher_name: "陈伟".to_owned(),
            description: String::new(),
            average_rating: Some(4.2),
            review_count: Some(20),
        }
    }

    fn runtime_with(
        courses: Vec<Course>,
        llm: Option<Arc<dyn LlmClient>>,
    ) -> (ChatRuntime, Arc<InMemoryConversationStore>) {
        let store = Arc::new(InMemoryConversationStore::new());
        let catalog = Arc::new(InMemoryCourseCatalog::new(courses));
        (ChatRuntime::new(store.clone(), catalog, llm), store)
    }

    #[tokio::test]
    async fn first_turn_creates_conversation_titles_it_and_recommends() {
        let (runtime, store) = runtime_with(
            vec![
                course(1, "程序设计基础", CourseType::Elective, 3.0),
                course(2, "机器学习", CourseType::Elective, 3.0),
            ],
            None,
        );

        let outcome =
            runtime.submit_turn("student-1", None, "我想要3学分的选修课").await.expect("turn");

        assert_eq!(outcome.reply.kind, ReplyKind::Recommendation);
        let conversation = store
            .snapshot(&outcome.conversation_id)
            .await
            .expect("conversation persisted");
        assert_eq!(conversation.title, "我想要3学分的选修课");
        assert_eq!(conversation.messages.len(), 2);
        assert_eq!(conversation.criteria.course_type, Some(CourseType::Elective));
        assert_eq!(conversation.criteria.credits, Some(3.0));
    }

    #[tokio::test]
    async fn criteria_accumulate_across_turns() {
        let (runtime, store) = runtime_with(
            vec![course(1, "机器学习", CourseType::Elective, 3.0)],
            None,
        );

        let first = runtime.submit_turn("student-1", None, "我想要选修课").await.expect("turn 1");
        let id = first.conversation_id.clone();
        runtime
            .submit_turn("student-1", Some(id.clone()), "3学分的，简单一点")
            .await
            .expect("turn 2");

        let conversation = store.snapshot(&id).await.expect("conversation");
        assert_eq!(conversation.criteria.course_type, Some(CourseType::Elective));
        assert_eq!(conversation.criteria.credits, Some(3.0));
        assert_eq!(conversation.criteria.difficulty, Some(Difficulty::Easy));
        // Two user turns, two assistant replies, append order preserved.
        assert_eq!(conversation.messages.len(), 4);
    }

    #[tokio::test]
    async fn llm_timeout_degrades_to_deterministic_extraction() {
        let (runtime, store) = runtime_with(
            vec![course(1, "程序设计基础", CourseType::Elective, 3.0)],
            Some(Arc::new(FailingClient)),
        );
        assert!(runtime.status().llm_available);

        let outcome = runtime
            .submit_turn("student-1", None, "我想要3学分的选修课")
            .await
            .expect("turn must complete despite llm failure");

        assert_eq!(outcome.reply.kind, ReplyKind::Recommendation);
        assert_eq!(outcome.reply.updated_context.course_type, Some(CourseType::Elective));
        assert_eq!(outcome.reply.updated_context.credits, Some(3.0));

        let conversation =
            store.snapshot(&outcome.conversation_id).await.expect("conversation");
        assert_eq!(conversation.messages.len(), 2, "user message and assistant reply both land");
    }

    #[tokio::test]
    async fn empty_catalog_turn_still_replies_with_text() {
        let (runtime, _store) = runtime_with(Vec::new(), None);

        let outcome = runtime.submit_turn("student-1", None, "推荐点什么").await.expect("turn");
        assert_eq!(outcome.reply.kind, ReplyKind::Text);
        assert!(outcome.reply.courses.is_none());
    }

    #[tokio::test]
    async fn concurrent_turns_on_one_conversation_lose_no_delta() {
        let (runtime, store) = runtime_with(
            vec![course(1, "机器学习", CourseType::Elective, 3.0)],
            None,
        );
        let runtime = Arc::new(runtime);
        let id = ConversationId::from("conv_shared");

        let left = {
            let runtime = runtime.clone();
            let id = Some(id.clone());
            tokio::spawn(async move {
                runtime.submit_turn("student-1", id, "我想要选修课").await
            })
        };
        let right = {
            let runtime = runtime.clone();
            let id = Some(id.clone());
            tokio::spawn(async move {
                runtime.submit_turn("student-1", id, "3学分的").await
            })
        };

        left.await.expect("join").expect("turn");
        right.await.expect("join").expect("turn");

        let conversation = store.snapshot(&id).await.expect("conversation");
        assert_eq!(conversation.criteria.course_type, Some(CourseType::Elective));
        assert_eq!(conversation.criteria.credits, Some(3.0));
        assert_eq!(conversation.messages.len(), 4);
    }

    #[tokio::test]
    async fn status_reports_rule_mode_without_llm() {
        let (runtime, _store) = runtime_with(Vec::new(), None);
        let status = runtime.status();
        assert!(!status.llm_available);
        assert_eq!(status.mode, "规则模式");
    }
}
