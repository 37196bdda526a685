use std::sync::Arc;

use crate::commands::CommandResult;
use coursey_agent::{ChatCompletionClient, ChatRuntime, LlmClient};
use coursey_core::config::{AppConfig, LoadOptions};
use coursey_core::{ConversationId, ConversationStore, CourseCatalog};
use coursey_db::{
    connect_with_settings, migrations, seed_courses, CachedCourseCatalog, SqlConversationStore,
    SqlCourseCatalog,
};

/// One-shot chat turn against the local database, for smoke runs without the
/// HTTP server.
pub fn run(message: &str, conversation: Option<&str>, user: &str) -> CommandResult {
    if message.trim().is_empty() {
        return CommandResult::failure("chat", "empty_message", "message must not be blank", 2);
    }

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        seed_courses(&pool).await.map_err(|error| ("seed", error.to_string(), 6u8))?;

        let store: Arc<dyn ConversationStore> =
            Arc::new(SqlConversationStore::new(pool.clone()));
        let catalog: Arc<dyn CourseCatalog> = Arc::new(CachedCourseCatalog::new(
            Arc::new(SqlCourseCatalog::new(pool.clone())),
            config.catalog.cache_ttl_secs,
        ));
        let llm_client: Option<Arc<dyn LlmClient>> = if config.llm.is_available() {
            ChatCompletionClient::from_config(&config.llm)
                .ok()
                .map(|client| Arc::new(client) as Arc<dyn LlmClient>)
        } else {
            None
        };

        let chat_runtime = ChatRuntime::new(store, catalog, llm_client);
        let outcome = chat_runtime
            .submit_turn(user, conversation.map(ConversationId::from), message)
            .await
            .map_err(|error| ("turn", error.to_string(), 7u8))?;

        let reply = serde_json::json!({
            "conversationId": outcome.conversation_id,
            "reply": outcome.reply,
        });
        pool.close().await;
        serde_json::to_string_pretty(&reply)
            .map_err(|error| ("serialization", error.to_string(), 8u8))
    });

    match result {
        Ok(reply) => CommandResult::success("chat", reply),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("chat", error_class, message, exit_code)
        }
    }
}
