use async_trait::async_trait;
use dl_core::{ArticleStorage, Error, Result};
use std::sync::Arc;
use tracing::info;

pub mod backends;
pub mod query;

pub use backends::*;
pub use query::query_articles;

pub const DEFAULT_COLLECTION: &str = "news";

#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn get_error_message() -> &'static str;
    async fn connect(config: &BackendConfig) -> Result<Self> where Self: Sized;
}

/// Where a backend lives and which collection (table) holds the articles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub url: String,
    pub collection: String,
}

impl BackendConfig {
    pub fn new(url: String, collection: String) -> Self {
        Self { url, collection }
    }
}

/// Connect the named backend. A failure here is a startup failure; the
/// caller decides what to do with it.
pub async fn create_storage(
    kind: &str,
    config: &BackendConfig,
) -> Result<Arc<dyn ArticleStorage>> {
    let storage: Arc<dyn ArticleStorage> = match kind {
        "memory" => Arc::new(MemoryStorage::connect(config).await?),
        #[cfg(feature = "sqlite")]
        "sqlite" => Arc::new(SQLiteStorage::connect(config).await.map_err(|e| {
            Error::Storage(format!("{} ({})", SQLiteStorage::get_error_message(), e))
        })?),
        other => return Err(Error::Config(format!("Unknown storage backend: {}", other))),
    };
    info!("💾 Storage ready (using {}, collection {})", kind, config.collection);
    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_storage() {
        let config = BackendConfig::new("memory://".to_string(), DEFAULT_COLLECTION.to_string());
        let storage = create_storage("memory", &config).await.unwrap();
        assert_eq!(storage.count_articles(&dl_core::ArticleFilter::any()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_backend_is_config_error() {
        let config = BackendConfig::new(String::new(), DEFAULT_COLLECTION.to_string());
        let result = create_storage("mongodb", &config).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
