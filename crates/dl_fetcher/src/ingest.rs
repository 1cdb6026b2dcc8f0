use chrono::Utc;
use dl_core::{normalize, ArticleStorage, Result, UpsertReport};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use crate::provider::{FetchRequest, NewsProvider};

/// What one ingestion run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Articles the provider returned
    pub fetched: usize,
    pub inserted: u64,
    pub updated: u64,
    /// Articles dropped because they could not be keyed
    pub skipped: usize,
}

/// Pulls articles from a provider and upserts them into storage.
pub struct Ingestor {
    storage: Arc<dyn ArticleStorage>,
    provider: Arc<dyn NewsProvider>,
}

impl Ingestor {
    pub fn new(storage: Arc<dyn ArticleStorage>, provider: Arc<dyn NewsProvider>) -> Self {
        Self { storage, provider }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Fetch once and store the results.
    ///
    /// Returns `None` when the provider had nothing, in which case storage
    /// is not touched. Provider and storage errors are returned as-is.
    pub async fn fetch_and_store(&self, request: &FetchRequest) -> Result<Option<IngestReport>> {
        info!(
            "🦗 Fetching latest news from {} (country={}, category={}, language={})",
            self.provider.name(),
            request.country,
            request.category().unwrap_or("-"),
            request.language()
        );

        let raw = self.provider.latest(request).await.map_err(|e| {
            error!("❌ Error fetching news: {}", e);
            e
        })?;

        if raw.is_empty() {
            info!("📭 No articles returned for {}", request.country);
            return Ok(None);
        }

        let fetched = raw.len();
        let fetched_at = Utc::now();
        let mut skipped = 0;
        let mut articles = Vec::with_capacity(fetched);
        for item in raw {
            match normalize(item, &request.country, fetched_at) {
                Ok(article) => articles.push(article),
                Err(e) => {
                    warn!("⚠️ Skipping article: {}", e);
                    skipped += 1;
                }
            }
        }

        let upsert = if articles.is_empty() {
            UpsertReport::default()
        } else {
            self.storage.upsert_articles(&articles).await.map_err(|e| {
                error!("❌ Error storing news: {}", e);
                e
            })?
        };

        info!("✅ Stored {} new articles, updated {}", upsert.inserted, upsert.updated);

        Ok(Some(IngestReport {
            fetched,
            inserted: upsert.inserted,
            updated: upsert.updated,
            skipped,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dl_core::{ArticleFilter, Error, RawArticle};
    use dl_storage::MemoryStorage;
    use serde_json::{json, Value};

    struct StubProvider {
        payload: std::result::Result<Vec<Value>, String>,
    }

    #[async_trait]
    impl NewsProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn latest(&self, _request: &FetchRequest) -> Result<Vec<RawArticle>> {
            match &self.payload {
                Ok(items) => Ok(items
                    .iter()
                    .filter_map(|item| item.as_object().cloned())
                    .collect()),
                Err(message) => Err(Error::Provider(message.clone())),
            }
        }
    }

    fn ingestor(
        storage: Arc<MemoryStorage>,
        payload: std::result::Result<Vec<Value>, String>,
    ) -> Ingestor {
        Ingestor::new(storage, Arc::new(StubProvider { payload }))
    }

    fn story(link: &str, pub_date: &str) -> Value {
        json!({ "link": link, "pubDate": pub_date, "language": "english" })
    }

    fn payload() -> Vec<Value> {
        vec![
            story("https://example.com/1", "2025-01-01 10:00:00"),
            story("https://example.com/2", "2025-01-01 11:00:00"),
            story("https://example.com/1", "2025-01-01 10:00:00"),
        ]
    }

    #[tokio::test]
    async fn test_ingesting_twice_updates_instead_of_inserting() {
        let storage = Arc::new(MemoryStorage::new());
        let ingestor = ingestor(storage.clone(), Ok(payload()));
        let request = FetchRequest::new("us");

        let first = ingestor.fetch_and_store(&request).await.unwrap().unwrap();
        assert_eq!(first.fetched, 3);
        assert_eq!(first.inserted, 2);
        assert_eq!(first.updated, 1);

        let second = ingestor.fetch_and_store(&request).await.unwrap().unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.updated, 3);

        assert_eq!(storage.count_articles(&ArticleFilter::any()).await.unwrap(), 2);
        let stored = storage.sample(10).await.unwrap();
        assert!(stored.iter().all(|a| a.country == "us" && a.status == "active"));
    }

    #[tokio::test]
    async fn test_empty_provider_result_writes_nothing() {
        let storage = Arc::new(MemoryStorage::new());
        let ingestor = ingestor(storage.clone(), Ok(vec![]));

        let report = ingestor.fetch_and_store(&FetchRequest::new("us")).await.unwrap();

        assert_eq!(report, None);
        assert_eq!(storage.count_articles(&ArticleFilter::any()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let storage = Arc::new(MemoryStorage::new());
        let ingestor = ingestor(storage.clone(), Err("quota exceeded".to_string()));

        let result = ingestor.fetch_and_store(&FetchRequest::new("us")).await;

        assert!(matches!(result, Err(Error::Provider(_))));
        assert_eq!(storage.count_articles(&ArticleFilter::any()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_articles_without_link_are_skipped() {
        let storage = Arc::new(MemoryStorage::new());
        let ingestor = ingestor(
            storage.clone(),
            Ok(vec![json!({ "title": "no link" }), json!({ "link": "https://example.com/9" })]),
        );

        let report = ingestor.fetch_and_store(&FetchRequest::new("gb")).await.unwrap().unwrap();

        assert_eq!(report, IngestReport { fetched: 2, inserted: 1, updated: 0, skipped: 1 });
    }

    #[tokio::test]
    async fn test_articles_with_odd_field_types_are_stored() {
        let storage = Arc::new(MemoryStorage::new());
        let ingestor = ingestor(
            storage.clone(),
            Ok(vec![
                json!({ "link": "https://example.com/1", "source_id": 42 }),
                json!({ "link": "https://example.com/2", "pubDate": 1735689600 }),
            ]),
        );

        let report = ingestor.fetch_and_store(&FetchRequest::new("us")).await.unwrap().unwrap();

        assert_eq!(report, IngestReport { fetched: 2, inserted: 2, updated: 0, skipped: 0 });
        assert_eq!(storage.count_articles(&ArticleFilter::any()).await.unwrap(), 2);
    }
}
