use async_trait::async_trait;
use crate::filter::ArticleFilter;
use crate::types::{Article, DistinctField, Pagination, UpsertReport};
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Write a batch of articles keyed on `link`: merge into the stored record
    /// when the link is known, insert otherwise.
    async fn upsert_articles(&self, articles: &[Article]) -> Result<UpsertReport>;

    /// Matching articles, newest `pubDate` first, restricted to one page
    async fn find_articles(
        &self,
        filter: &ArticleFilter,
        pagination: Pagination,
    ) -> Result<Vec<Article>>;

    /// Number of articles matching the filter, ignoring pagination
    async fn count_articles(&self, filter: &ArticleFilter) -> Result<u64>;

    /// Distinct non-empty values of a field, sequences unwound
    async fn distinct_values(&self, field: DistinctField) -> Result<Vec<String>>;

    /// The first `limit` articles in storage order
    async fn sample(&self, limit: usize) -> Result<Vec<Article>>;
}
