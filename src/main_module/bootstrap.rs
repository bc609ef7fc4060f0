//! Store and provider initialization

use log::{error, info};
use std::sync::Arc;

use crate::core::config::{AppConfig, ConfigError, StoreBackend};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::create_conn;
use crate::llm::{LLMProvider, OpenAIClient};
use crate::tickets::{MemoryTicketStore, PgTicketStore, RestTicketStore, TicketStore};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Database pool creation failed: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("Database migration failed: {0}")]
    Migration(String),
    #[error("Blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub async fn init_ticket_store(config: &AppConfig) -> Result<Arc<dyn TicketStore>, BootstrapError> {
    let store = &config.store;
    info!("Initializing {} ticket store", store.backend);

    match store.backend {
        StoreBackend::Postgres => {
            let url = store
                .database_url
                .clone()
                .ok_or(ConfigError::Missing("store.database_url"))?;
            let pool_size = store.pool_size;
            let pool = tokio::task::spawn_blocking(move || create_conn(&url, pool_size)).await??;

            let pg = PgTicketStore::new(pool);
            let migrator = pg.clone();
            tokio::task::spawn_blocking(move || migrator.migrate())
                .await?
                .map_err(|e| {
                    error!("Failed to run migrations: {}", e);
                    BootstrapError::Migration(e.to_string())
                })?;
            info!("Database migrations completed successfully");
            Ok(Arc::new(pg))
        }
        StoreBackend::Rest => {
            let url = store.url.as_deref().ok_or(ConfigError::Missing("store.url"))?;
            let key = store
                .api_key
                .clone()
                .ok_or(ConfigError::Missing("store.api_key"))?;
            Ok(Arc::new(RestTicketStore::new(url, key)))
        }
        StoreBackend::Memory => Ok(Arc::new(MemoryTicketStore::new())),
    }
}

pub fn init_llm_provider(config: &AppConfig) -> Result<Arc<dyn LLMProvider>, BootstrapError> {
    let api_key = config
        .llm
        .api_key
        .clone()
        .ok_or(ConfigError::Missing("llm.api_key"))?;
    info!("Chat relay using model {}", config.llm.model);
    Ok(Arc::new(OpenAIClient::new(
        api_key,
        Some(config.llm.base_url.clone()),
        config.llm.model.clone(),
    )))
}

/// Create the AppState
pub async fn create_app_state(config: AppConfig) -> Result<Arc<AppState>, BootstrapError> {
    let store = init_ticket_store(&config).await?;
    let provider = init_llm_provider(&config)?;
    info!(
        "Server configured to listen on {}:{}",
        config.server.host, config.server.port
    );
    Ok(Arc::new(AppState::new(config, store, provider)))
}
