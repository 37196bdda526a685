//! Agent layer - language in, language out, decisions elsewhere.
//!
//! This crate turns free-text utterances into structured [`Criteria`] deltas
//! and ranked results back into user-facing messages:
//!
//! 1. **Criteria extraction** (`extract`) - parse NL → criteria delta, via a
//!    deterministic keyword strategy or an LLM-backed one
//! 2. **Recommendation** - delegated to the pure rule engine in
//!    `coursey-core`
//! 3. **Narration** (`narrative`) - compose the reply, template-based or
//!    LLM-backed
//! 4. **Orchestration** (`runtime`) - the per-conversation turn pipeline:
//!    extract → merge → recommend → narrate → persist
//!
//! # Safety principle
//!
//! The LLM is strictly a translator. It never picks courses, never scores,
//! and never touches stored state. Every ranking decision is made by the
//! deterministic rule engine, and both LLM strategies carry mandatory
//! deterministic fallbacks so a turn always completes.
//!
//! [`Criteria`]: coursey_core::Criteria

pub mod extract;
pub mod llm;
pub mod narrative;
pub mod prompts;
pub mod runtime;

pub use extract::{
    CriteriaExtractor, DeterministicExtractor, Extraction, ExtractionError, LlmExtractor,
};
pub use llm::{ChatCompletionClient, ChatRequest, LlmClient, LlmError};
pub use narrative::{
    CourseReason, LlmNarrator, Narrative, NarrativeGenerator, NarrationError, TemplateNarrator,
};
pub use runtime::{ChatRuntime, RuntimeStatus, TurnOutcome};
