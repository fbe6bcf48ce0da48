//! Application state for the study assistant server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::StudyRagConfig;
use crate::error::Result;
use crate::services::{Providers, Services};
use crate::storage::StudyDb;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StudyRagConfig,
    services: Services,
    ready: RwLock<bool>,
}

impl AppState {
    /// Open the database and build the Ollama-backed services
    pub async fn new(config: StudyRagConfig) -> Result<Self> {
        tracing::info!("Initializing study assistant state...");

        let db_path = config.storage.database_path.clone();
        let db = tokio::task::spawn_blocking(move || StudyDb::new(db_path))
            .await
            .map_err(|e| crate::error::Error::Internal(format!("Task join error: {}", e)))??;
        tracing::info!("Database ready at {}", config.storage.database_path.display());

        let providers = Providers::from_config(&config).await?;
        if !providers.llm.health_check().await.unwrap_or(false) {
            tracing::warn!(
                "LLM provider {} not reachable; requests will fail until it is",
                providers.llm.name()
            );
        }

        Self::with_providers(config, db, providers)
    }

    /// State over explicitly supplied providers
    pub fn with_providers(config: StudyRagConfig, db: StudyDb, providers: Providers) -> Result<Self> {
        let services = Services::new(&config, db, providers)?;
        tracing::info!("Vector indexes under {}", config.storage.index_root.display());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                services,
                ready: RwLock::new(true),
            }),
        })
    }

    pub fn config(&self) -> &StudyRagConfig {
        &self.inner.config
    }

    pub fn services(&self) -> &Services {
        &self.inner.services
    }

    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
