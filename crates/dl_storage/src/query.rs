use dl_core::{Article, ArticleFilter, ArticleStorage, Page, Pagination, Result};
use tracing::debug;

/// Run a filtered, paginated read: one page of matches (newest `pubDate`
/// first) together with the total number of matches.
pub async fn query_articles(
    storage: &dyn ArticleStorage,
    filter: &ArticleFilter,
    pagination: Pagination,
) -> Result<Page<Article>> {
    let (results, total) = futures::try_join!(
        storage.find_articles(filter, pagination),
        storage.count_articles(filter),
    )?;

    debug!("Found {} articles, total: {}", results.len(), total);

    Ok(Page {
        total,
        page: pagination.page,
        limit: pagination.limit,
        total_pages: pagination.total_pages(total),
        results,
    })
}
