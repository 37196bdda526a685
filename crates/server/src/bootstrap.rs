use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use coursey_agent::{ChatCompletionClient, ChatRuntime, LlmClient};
use coursey_core::config::{AppConfig, ConfigError, LoadOptions};
use coursey_core::{ConversationStore, CourseCatalog};
use coursey_db::{
    connect_with_settings, migrations, seed_courses, CachedCourseCatalog, DbPool,
    SqlConversationStore, SqlCourseCatalog,
};

use crate::routes::AppState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("catalog seed failed: {0}")]
    Seed(String),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let seeded = seed_courses(&db_pool)
        .await
        .map_err(|error| BootstrapError::Seed(error.to_string()))?;
    info!(
        event_name = "system.bootstrap.catalog_seeded",
        correlation_id = "bootstrap",
        inserted = seeded.inserted,
        skipped = seeded.skipped,
        "catalog seed checked"
    );

    let store: Arc<dyn ConversationStore> = Arc::new(SqlConversationStore::new(db_pool.clone()));
    let catalog: Arc<dyn CourseCatalog> = Arc::new(CachedCourseCatalog::new(
        Arc::new(SqlCourseCatalog::new(db_pool.clone())),
        config.catalog.cache_ttl_secs,
    ));

    let llm_client: Option<Arc<dyn LlmClient>> = if config.llm.is_available() {
        match ChatCompletionClient::from_config(&config.llm) {
            Ok(client) => Some(Arc::new(client)),
            Err(error) => {
                warn!(
                    event_name = "system.bootstrap.llm_unavailable",
                    correlation_id = "bootstrap",
                    %error,
                    "llm client could not be built, running in rule mode"
                );
                None
            }
        }
    } else {
        None
    };

    let runtime = Arc::new(ChatRuntime::new(store.clone(), catalog, llm_client));
    info!(
        event_name = "system.bootstrap.runtime_ready",
        correlation_id = "bootstrap",
        llm_available = runtime.status().llm_available,
        "chat runtime ready"
    );

    let state = AppState { runtime, store, db_pool: db_pool.clone() };
    Ok(Application { config, db_pool, state })
}
