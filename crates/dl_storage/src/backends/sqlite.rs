use async_trait::async_trait;
use dl_core::{
    Article, ArticleFilter, ArticleStorage, DistinctField, Error, Pagination, Result, UpsertReport,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use crate::{BackendConfig, StorageBackend};

// Each article is kept whole as JSON in `doc`; the scalar columns are copies
// used for filtering, sorting and the uniqueness constraint on `link`.
const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS {table} (
        link TEXT PRIMARY KEY,
        country TEXT NOT NULL,
        source_id TEXT,
        pub_date TEXT,
        status TEXT NOT NULL,
        fetched_at TEXT NOT NULL,
        doc TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS {table}_pub_date ON {table} (pub_date DESC)",
    "CREATE INDEX IF NOT EXISTS {table}_country ON {table} (country)",
    // Add future migrations here
];

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
    table: String,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be available at DATABASE_URL"
    }

    async fn connect(config: &BackendConfig) -> Result<Self> {
        let path = config
            .url
            .strip_prefix("sqlite://")
            .or_else(|| config.url.strip_prefix("sqlite:"))
            .unwrap_or(&config.url);
        Self::new_with_path(Path::new(path), &config.collection).await
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path, table: &str) -> Result<Self> {
        validate_table_name(table)?;

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(storage_error("Failed to connect to database"))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(&migration.replace("{table}", table))
                .execute(&pool)
                .await
                .map_err(|e| Error::Storage(format!("Failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self {
            pool: Arc::new(pool),
            table: table.to_string(),
        })
    }

    async fn fetch_docs(
        &self,
        sql: &str,
        binds: &[String],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Article>> {
        let mut query = sqlx::query_scalar::<_, String>(sql);
        for value in binds {
            query = query.bind(value);
        }
        let docs = query
            .bind(limit)
            .bind(offset)
            .fetch_all(&*self.pool)
            .await
            .map_err(storage_error("Failed to query articles"))?;

        docs.iter()
            .map(|doc| serde_json::from_str(doc).map_err(Error::Serialization))
            .collect()
    }
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn upsert_articles(&self, articles: &[Article]) -> Result<UpsertReport> {
        let select = format!("SELECT doc FROM {} WHERE link = ?", self.table);
        let upsert = format!(
            r#"
            INSERT INTO {}
            (link, country, source_id, pub_date, status, fetched_at, doc)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(link) DO UPDATE SET
                country = excluded.country,
                source_id = excluded.source_id,
                pub_date = excluded.pub_date,
                status = excluded.status,
                fetched_at = excluded.fetched_at,
                doc = excluded.doc
            "#,
            self.table
        );

        let mut report = UpsertReport::default();
        // dropped without commit on any error, which rolls the batch back
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(storage_error("Failed to start batch"))?;

        for article in articles {
            let existing: Option<String> = sqlx::query_scalar(&select)
                .bind(&article.link)
                .fetch_optional(&mut *tx)
                .await
                .map_err(storage_error("Failed to look up article"))?;

            let doc = match existing {
                Some(doc) => {
                    let mut stored: Article = serde_json::from_str(&doc)?;
                    stored.merge(article.clone());
                    report.updated += 1;
                    stored
                }
                None => {
                    report.inserted += 1;
                    article.clone()
                }
            };

            sqlx::query(&upsert)
                .bind(&doc.link)
                .bind(&doc.country)
                .bind(doc.source_id.as_deref())
                .bind(doc.pub_date.as_deref())
                .bind(&doc.status)
                .bind(doc.fetched_at.to_rfc3339())
                .bind(serde_json::to_string(&doc)?)
                .execute(&mut *tx)
                .await
                .map_err(storage_error("Failed to store article"))?;
        }

        tx.commit().await.map_err(storage_error("Failed to commit batch"))?;
        Ok(report)
    }

    async fn find_articles(
        &self,
        filter: &ArticleFilter,
        pagination: Pagination,
    ) -> Result<Vec<Article>> {
        let (clause, binds) = where_clause(filter);
        // NULL sorts lowest in SQLite, so undated articles land last
        let sql = format!(
            "SELECT doc FROM {}{} ORDER BY pub_date DESC, rowid ASC LIMIT ? OFFSET ?",
            self.table, clause
        );
        debug!("SQL: {}", sql);
        let limit = to_sql_int(pagination.limit);
        let offset = to_sql_int(pagination.offset());
        self.fetch_docs(&sql, &binds, limit, offset).await
    }

    async fn count_articles(&self, filter: &ArticleFilter) -> Result<u64> {
        let (clause, binds) = where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM {}{}", self.table, clause);
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for value in &binds {
            query = query.bind(value);
        }
        let count = query
            .fetch_one(&*self.pool)
            .await
            .map_err(storage_error("Failed to count articles"))?;
        Ok(count as u64)
    }

    async fn distinct_values(&self, field: DistinctField) -> Result<Vec<String>> {
        let name = field.field_name();
        let sql = if field.is_sequence() {
            format!(
                "SELECT DISTINCT j.value FROM {t}, json_each({t}.doc, '$.{f}') AS j \
                 WHERE j.type = 'text' AND j.value <> '' ORDER BY j.value",
                t = self.table,
                f = name
            )
        } else {
            format!(
                "SELECT DISTINCT {f} FROM {t} WHERE {f} IS NOT NULL AND {f} <> '' ORDER BY {f}",
                t = self.table,
                f = name
            )
        };

        sqlx::query_scalar::<_, String>(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(storage_error("Failed to list distinct values"))
    }

    async fn sample(&self, limit: usize) -> Result<Vec<Article>> {
        let sql = format!("SELECT doc FROM {} ORDER BY rowid ASC LIMIT ? OFFSET ?", self.table);
        self.fetch_docs(&sql, &[], to_sql_int(limit as u64), 0).await
    }
}

/// Translate the predicate into a SQL `WHERE` clause and its bind values,
/// in order.
fn where_clause(filter: &ArticleFilter) -> (String, Vec<String>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut binds = Vec::new();

    if let Some(country) = &filter.country {
        clauses.push("country = ?");
        binds.push(country.clone());
    }
    if let Some(category) = &filter.category {
        clauses.push(
            "EXISTS (SELECT 1 FROM json_each(doc, '$.category') WHERE json_each.value = ?)",
        );
        binds.push(category.clone());
    }
    if let Some(language) = &filter.language {
        clauses.push(
            "EXISTS (SELECT 1 FROM json_each(doc, '$.language') WHERE json_each.value = ?)",
        );
        binds.push(language.clone());
    }
    if let Some(source_id) = &filter.source_id {
        clauses.push("source_id = ?");
        binds.push(source_id.clone());
    }
    if let Some(status) = &filter.status {
        clauses.push("status = ?");
        binds.push(status.clone());
    }
    if let Some(start) = &filter.pub_date.start {
        clauses.push("pub_date >= ?");
        binds.push(start.clone());
    }
    if let Some(end) = &filter.pub_date.end {
        clauses.push("pub_date <= ?");
        binds.push(end.clone());
    }

    if clauses.is_empty() {
        (String::new(), binds)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), binds)
    }
}

// SQLite integers are signed; a negative OFFSET would be read as 0.
fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn validate_table_name(table: &str) -> Result<()> {
    let valid = table.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::Config(format!("Invalid collection name: {:?}", table)))
    }
}

fn storage_error(context: &'static str) -> impl Fn(sqlx::Error) -> Error {
    move |e| Error::Storage(format!("{}: {}", context, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use tempfile::tempdir;

    fn article(link: &str, pub_date: Option<&str>, language: &str) -> Article {
        serde_json::from_value(json!({
            "link": link,
            "country": "us",
            "category": ["top"],
            "language": [language],
            "source_id": "cnn",
            "pubDate": pub_date,
            "fetchedAt": Utc::now(),
            "status": "active",
            "title": "Original"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_sqlite_upsert_and_query() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let storage = SQLiteStorage::new_with_path(&db_path, "news").await.unwrap();

        let batch = vec![
            article("https://example.com/1", Some("2025-01-01 09:00:00"), "english"),
            article("https://example.com/2", Some("2025-01-02 09:00:00"), "spanish"),
            article("https://example.com/3", None, "english"),
        ];
        let first = storage.upsert_articles(&batch).await.unwrap();
        assert_eq!(first, UpsertReport { inserted: 3, updated: 0 });

        let second = storage.upsert_articles(&batch).await.unwrap();
        assert_eq!(second, UpsertReport { inserted: 0, updated: 3 });
        assert_eq!(storage.count_articles(&ArticleFilter::any()).await.unwrap(), 3);

        let found = storage
            .find_articles(&ArticleFilter::any().with_status("active"), Pagination::default())
            .await
            .unwrap();
        let links: Vec<&str> = found.iter().map(|a| a.link.as_str()).collect();
        assert_eq!(
            links,
            vec!["https://example.com/2", "https://example.com/1", "https://example.com/3"]
        );
        assert_eq!(found[0].extra["title"], "Original");
    }

    #[tokio::test]
    async fn test_sqlite_merge_keeps_stored_extras() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("merge.db"), "news")
            .await
            .unwrap();

        let mut first = article("https://example.com/1", Some("2025-01-01"), "english");
        first.extra.insert("image_url".to_string(), json!("https://img.example/1.png"));
        storage.upsert_articles(&[first]).await.unwrap();

        let mut second = article("https://example.com/1", Some("2025-01-05"), "english");
        second.extra.insert("title".to_string(), json!("Updated"));
        storage.upsert_articles(&[second]).await.unwrap();

        let stored = storage.sample(5).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].pub_date.as_deref(), Some("2025-01-05"));
        assert_eq!(stored[0].extra["title"], "Updated");
        assert_eq!(stored[0].extra["image_url"], "https://img.example/1.png");
    }

    #[tokio::test]
    async fn test_sqlite_filters_match_memory_semantics() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("filters.db"), "news")
            .await
            .unwrap();

        storage
            .upsert_articles(&[
                article("https://example.com/1", Some("2025-01-01"), "english"),
                article("https://example.com/2", Some("2025-01-15"), "xx"),
                article("https://example.com/3", None, "english"),
            ])
            .await
            .unwrap();

        let english = ArticleFilter {
            language: Some("english".to_string()),
            ..ArticleFilter::any()
        };
        assert_eq!(storage.count_articles(&english).await.unwrap(), 2);

        let january = ArticleFilter {
            pub_date: dl_core::DateRange {
                start: Some("2025-01-10".to_string()),
                end: Some("2025-01-31".to_string()),
            },
            ..ArticleFilter::any()
        };
        let found = storage.find_articles(&january, Pagination::default()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].link, "https://example.com/2");

        let missing = ArticleFilter::any().with_category("sports");
        assert_eq!(storage.count_articles(&missing).await.unwrap(), 0);

        assert_eq!(
            storage.distinct_values(DistinctField::Language).await.unwrap(),
            vec!["english", "xx"]
        );
        assert_eq!(storage.distinct_values(DistinctField::Source).await.unwrap(), vec!["cnn"]);
    }

    #[tokio::test]
    async fn test_sqlite_page_past_the_end_is_empty() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("pages.db"), "news")
            .await
            .unwrap();
        storage
            .upsert_articles(&[article("https://example.com/1", Some("2025-01-01"), "english")])
            .await
            .unwrap();

        let far = Pagination::new(500_000_000_000_000_000, 20);
        assert!(far.offset() > i64::MAX as u64);
        let found = storage.find_articles(&ArticleFilter::any(), far).await.unwrap();
        assert!(found.is_empty());

        let next = Pagination::new(2, 20);
        assert!(storage.find_articles(&ArticleFilter::any(), next).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_table_name_is_rejected() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("bad.db");
        let result = SQLiteStorage::new_with_path(&path, "news; DROP TABLE x").await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
