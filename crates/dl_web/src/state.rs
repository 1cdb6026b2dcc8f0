use std::sync::Arc;
use dl_core::{ArticleStorage, Result};
use dl_fetcher::{Ingestor, NewsProvider};
use dl_storage::{create_storage, BackendConfig};

/// Everything a handler needs, built once at startup and shared.
pub struct AppState {
    pub storage: Arc<dyn ArticleStorage>,
    pub ingestor: Arc<Ingestor>,
}

impl AppState {
    pub fn new(storage: Arc<dyn ArticleStorage>, provider: Arc<dyn NewsProvider>) -> Self {
        let ingestor = Arc::new(Ingestor::new(storage.clone(), provider));
        Self { storage, ingestor }
    }

    /// Connect the configured storage backend. A connection failure is
    /// returned, never turned into a process exit here.
    pub async fn bootstrap(
        storage_kind: &str,
        backend: &BackendConfig,
        provider: Arc<dyn NewsProvider>,
    ) -> Result<Self> {
        let storage = create_storage(storage_kind, backend).await?;
        Ok(Self::new(storage, provider))
    }
}
