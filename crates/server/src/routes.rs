//! HTTP surface for the recommendation chat and conversation management.
//!
//! Auth is out of scope; callers identify themselves with the `x-user-id`
//! header. No raw service error ever reaches a response body - failures map
//! to the interface taxonomy and its user-safe messages.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use coursey_agent::ChatRuntime;
use coursey_core::{
    ApplicationError, ChatReply, Conversation, ConversationId, ConversationStore, InterfaceError,
    StoreError,
};
use coursey_db::DbPool;

const USER_ID_HEADER: &str = "x-user-id";
const ANONYMOUS_USER: &str = "anonymous";

#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<ChatRuntime>,
    pub store: Arc<dyn ConversationStore>,
    pub db_pool: DbPool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/recommendations/status", get(status))
        .route("/api/recommendations/chat", post(chat))
        .route(
            "/api/recommendations/conversations",
            get(list_conversations).post(create_conversation).delete(delete_all_conversations),
        )
        .route(
            "/api/recommendations/conversations/{id}",
            get(get_conversation).delete(delete_conversation),
        )
        .route("/api/recommendations/conversations/{id}/title", put(update_title))
        .with_state(state)
}

fn caller(headers: &HeaderMap) -> String {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(ANONYMOUS_USER)
        .to_owned()
}

fn interface_response(interface: InterfaceError) -> Response {
    let status = match &interface {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": interface.user_message() }))).into_response()
}

fn store_failure(error: StoreError, correlation_id: &str) -> Response {
    match error {
        StoreError::NotFound(id) => {
            (StatusCode::NOT_FOUND, Json(json!({ "error": format!("对话不存在: {id}") })))
                .into_response()
        }
        StoreError::Backend(message) => {
            error!(
                event_name = "api.store.failed",
                %correlation_id,
                %message,
                "conversation store failure"
            );
            interface_response(
                ApplicationError::Persistence(message).into_interface(correlation_id),
            )
        }
    }
}

async fn healthz(State(state): State<AppState>) -> Response {
    match sqlx::query("SELECT 1").execute(&state.db_pool).await {
        Ok(_) => Json(json!({ "status": "ok" })).into_response(),
        Err(error) => {
            error!(event_name = "api.health.failed", %error, "health check db ping failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "degraded" })))
                .into_response()
        }
    }
}

async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let status = state.runtime.status();
    Json(json!({ "available": status.llm_available, "mode": status.mode }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequestBody {
    message: String,
    #[serde(default)]
    conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatTurnResponse {
    conversation_id: ConversationId,
    #[serde(flatten)]
    reply: ChatReply,
}

async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequestBody>,
) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    if request.message.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "消息内容不能为空" })))
            .into_response();
    }

    let user_id = caller(&headers);
    let conversation_id = request.conversation_id.map(ConversationId);

    match state.runtime.submit_turn(&user_id, conversation_id, &request.message).await {
        Ok(outcome) => {
            info!(
                event_name = "api.chat.replied",
                %correlation_id,
                conversation_id = %outcome.conversation_id,
                "chat turn replied"
            );
            Json(ChatTurnResponse {
                conversation_id: outcome.conversation_id,
                reply: outcome.reply,
            })
            .into_response()
        }
        Err(application_error) => {
            error!(
                event_name = "api.chat.failed",
                %correlation_id,
                error = %application_error,
                "chat turn failed"
            );
            interface_response(application_error.into_interface(correlation_id.as_str()))
        }
    }
}

async fn list_conversations(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    match state.store.list_all(&caller(&headers)).await {
        Ok(summaries) => Json(summaries).into_response(),
        Err(error) => store_failure(error, &correlation_id),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateConversationBody {
    #[serde(default)]
    conversation_id: Option<String>,
}

async fn create_conversation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateConversationBody>,
) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let id = body.conversation_id.map(ConversationId).unwrap_or_else(ConversationId::generate);

    let conversation = Conversation::new(id, caller(&headers));
    match state.store.create(conversation.clone()).await {
        Ok(()) => (StatusCode::CREATED, Json(conversation)).into_response(),
        Err(error) => store_failure(error, &correlation_id),
    }
}

async fn get_conversation(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    match state.store.get(&ConversationId(id.clone())).await {
        Ok(Some(conversation)) => Json(conversation).into_response(),
        Ok(None) => {
            (StatusCode::NOT_FOUND, Json(json!({ "error": format!("对话不存在: {id}") })))
                .into_response()
        }
        Err(error) => store_failure(error, &correlation_id),
    }
}

#[derive(Debug, Deserialize)]
struct UpdateTitleBody {
    title: String,
}

async fn update_title(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateTitleBody>,
) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    if body.title.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "标题不能为空" })))
            .into_response();
    }

    match state.store.update_title(&ConversationId(id), body.title.trim()).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => store_failure(error, &correlation_id),
    }
}

async fn delete_conversation(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    match state.store.delete(&ConversationId(id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => store_failure(error, &correlation_id),
    }
}

async fn delete_all_conversations(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    match state.store.delete_all(&caller(&headers)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => store_failure(error, &correlation_id),
    }
}
