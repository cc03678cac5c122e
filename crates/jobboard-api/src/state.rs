//! Application state.

use std::sync::Arc;

use jobboard_firestore::{
    ApplicationRepository, DocumentStore, FirestoreClient, FirestoreResult, JobRepository,
    MemoryStore,
};
use tracing::warn;

use crate::config::{ApiConfig, StoreBackend};
use crate::services::ApplicationService;
use crate::session::SessionCodec;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn DocumentStore>,
    pub sessions: Arc<SessionCodec>,
    pub jobs: JobRepository,
    pub applications: ApplicationService,
}

impl AppState {
    /// Create state backed by the configured store.
    pub async fn new(config: ApiConfig) -> FirestoreResult<Self> {
        let store: Arc<dyn DocumentStore> = match config.store_backend {
            StoreBackend::Firestore => Arc::new(FirestoreClient::from_env().await?),
            StoreBackend::Memory => {
                warn!("Using the in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };
        Ok(Self::with_store(config, store))
    }

    /// Create state over an existing store.
    pub fn with_store(config: ApiConfig, store: Arc<dyn DocumentStore>) -> Self {
        let jobs = JobRepository::new(Arc::clone(&store));
        let applications = ApplicationService::new(
            ApplicationRepository::new(Arc::clone(&store)),
            jobs.clone(),
        );
        let sessions = Arc::new(SessionCodec::new(&config.access_token_secret));

        Self {
            config,
            store,
            sessions,
            jobs,
            applications,
        }
    }
}
