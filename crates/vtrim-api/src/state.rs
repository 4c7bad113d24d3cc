//! Application state.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use vtrim_engine::{EngineConfig, PipelineSession};
use vtrim_services::{HttpStageServices, StageServices};

use crate::config::ApiConfig;

/// Registry of live editing sessions.
#[derive(Default)]
pub struct SessionRegistry {
    inner: RwLock<HashMap<String, Arc<PipelineSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under its ID.
    pub async fn insert(&self, session: Arc<PipelineSession>) {
        let mut sessions = self.inner.write().await;
        sessions.insert(session.id().to_string(), session);
    }

    /// Look up a session.
    pub async fn get(&self, session_id: &str) -> Option<Arc<PipelineSession>> {
        let sessions = self.inner.read().await;
        sessions.get(session_id).cloned()
    }

    /// Drop a session.
    pub async fn remove(&self, session_id: &str) -> Option<Arc<PipelineSession>> {
        let mut sessions = self.inner.write().await;
        sessions.remove(session_id)
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        let sessions = self.inner.read().await;
        sessions.len()
    }

    /// Whether any session is live.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub engine_config: EngineConfig,
    pub services: Arc<dyn StageServices>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Create new application state backed by the real media service.
    pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let services = Arc::new(HttpStageServices::from_env()?);
        Ok(Self::with_services(config, services))
    }

    /// Create application state with explicit stage services.
    pub fn with_services(config: ApiConfig, services: Arc<dyn StageServices>) -> Self {
        Self {
            config,
            engine_config: EngineConfig::from_env(),
            services,
            sessions: Arc::new(SessionRegistry::new()),
        }
    }

    /// Create and register a fresh session.
    pub async fn create_session(&self) -> Arc<PipelineSession> {
        let session = Arc::new(PipelineSession::new(
            Arc::clone(&self.services),
            self.engine_config.clone(),
        ));
        self.sessions.insert(Arc::clone(&session)).await;
        session
    }
}
