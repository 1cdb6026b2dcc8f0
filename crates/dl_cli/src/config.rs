use anyhow::bail;
use dl_fetcher::provider::DEFAULT_BASE_URL;
use dl_fetcher::{NewsDataClient, NewsProvider};
use dl_storage::{BackendConfig, DEFAULT_COLLECTION};
use std::fmt;
use std::sync::Arc;

/// Process configuration loaded from the environment.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (e.g. "0.0.0.0:5000").
    pub bind_addr: String,
    /// Storage backend name: "sqlite" or "memory".
    pub storage: String,
    /// Database location and collection (table) name.
    pub backend: BackendConfig,
    /// NewsData.io API key.
    pub news_api_key: Option<String>,
    /// NewsData.io API base URL.
    pub news_api_url: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("storage", &self.storage)
            .field("backend", &self.backend)
            .field("news_api_key", &self.news_api_key.as_deref().map(|_| "<redacted>"))
            .field("news_api_url", &self.news_api_url)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// - `NEWS_API_KEY`: provider API key (required to fetch)
    /// - `NEWS_API_URL`: provider base URL (default: "https://newsdata.io/api/1")
    /// - `DEVLOOK_STORAGE`: "sqlite" (default) or "memory"
    /// - `DATABASE_URL`: SQLite database file (default: "devlook.db")
    /// - `DEVLOOK_COLLECTION`: table holding the articles (default: "news")
    /// - `DEVLOOK_BIND_ADDR`: server bind address (default: "0.0.0.0:5000")
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let storage = var("DEVLOOK_STORAGE").unwrap_or_else(|| "sqlite".to_string());
        if !matches!(storage.as_str(), "sqlite" | "memory") {
            bail!("DEVLOOK_STORAGE must be 'sqlite' or 'memory', got '{}'", storage);
        }

        let backend = BackendConfig::new(
            var("DATABASE_URL").unwrap_or_else(|| "devlook.db".to_string()),
            var("DEVLOOK_COLLECTION").unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
        );

        Ok(Self {
            bind_addr: var("DEVLOOK_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:5000".to_string()),
            storage,
            backend,
            news_api_key: var("NEWS_API_KEY"),
            news_api_url: var("NEWS_API_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    /// Build the news provider client.
    pub fn provider(&self) -> anyhow::Result<Arc<dyn NewsProvider>> {
        let Some(api_key) = self.news_api_key.clone() else {
            bail!("NEWS_API_KEY environment variable is required");
        };
        let client = NewsDataClient::with_base_url(api_key, &self.news_api_url)?;
        Ok(Arc::new(client))
    }
}
