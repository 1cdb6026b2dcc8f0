use async_trait::async_trait;
use dl_core::{
    Article, ArticleFilter, ArticleStorage, DistinctField, Pagination, Result, UpsertReport,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::{BackendConfig, StorageBackend};

/// Articles in insertion order plus a link index. Insertion order is the
/// natural order used for sort ties and samples.
#[derive(Debug, Default)]
pub struct MemoryStore {
    articles: Vec<Article>,
    by_link: HashMap<String, usize>,
}

impl MemoryStore {
    /// Returns true when the article was new.
    fn upsert(&mut self, article: &Article) -> bool {
        match self.by_link.get(&article.link) {
            Some(&index) => {
                self.articles[index].merge(article.clone());
                false
            }
            None => {
                self.by_link.insert(article.link.clone(), self.articles.len());
                self.articles.push(article.clone());
                true
            }
        }
    }

    fn matching<'a>(&'a self, filter: &'a ArticleFilter) -> impl Iterator<Item = &'a Article> + 'a {
        self.articles.iter().filter(move |article| filter.matches(article))
    }

    fn find(&self, filter: &ArticleFilter, pagination: Pagination) -> Vec<Article> {
        let mut found: Vec<&Article> = self.matching(filter).collect();
        // stable, so equal dates keep insertion order; missing dates sort last
        found.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));
        found
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit as usize)
            .cloned()
            .collect()
    }

    fn distinct(&self, field: DistinctField) -> Vec<String> {
        let mut values = BTreeSet::new();
        for article in &self.articles {
            match field {
                DistinctField::Category => values.extend(article.category.iter().cloned()),
                DistinctField::Language => values.extend(article.language.iter().cloned()),
                DistinctField::Country => {
                    values.insert(article.country.clone());
                }
                DistinctField::Source => values.extend(article.source_id.iter().cloned()),
            }
        }
        values.into_iter().filter(|v| !v.is_empty()).collect()
    }
}

/// Process-local storage. Nothing survives a restart.
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryStore::default())),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn connect(_config: &BackendConfig) -> Result<Self> {
        Ok(Self::new())
    }
}

#[async_trait]
impl ArticleStorage for MemoryStorage {
    async fn upsert_articles(&self, articles: &[Article]) -> Result<UpsertReport> {
        let mut store = self.store.write().await;
        let mut report = UpsertReport::default();
        for article in articles {
            if store.upsert(article) {
                report.inserted += 1;
            } else {
                report.updated += 1;
            }
        }
        Ok(report)
    }

    async fn find_articles(
        &self,
        filter: &ArticleFilter,
        pagination: Pagination,
    ) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.find(filter, pagination))
    }

    async fn count_articles(&self, filter: &ArticleFilter) -> Result<u64> {
        let store = self.store.read().await;
        Ok(store.matching(filter).count() as u64)
    }

    async fn distinct_values(&self, field: DistinctField) -> Result<Vec<String>> {
        let store = self.store.read().await;
        Ok(store.distinct(field))
    }

    async fn sample(&self, limit: usize) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.articles.iter().take(limit).cloned().collect())
    }
}
