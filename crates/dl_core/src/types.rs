use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The only status the ingestion path ever writes.
pub const STATUS_ACTIVE: &str = "active";

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// A provider article exactly as it came off the wire.
pub type RawArticle = Map<String, Value>;

/// A stored news article. `link` is the natural key.
///
/// Fields the provider sends that are not modelled here are kept in `extra`
/// and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub link: String,
    #[serde(default)]
    pub country: String,
    #[serde(default, deserialize_with = "string_or_seq")]
    pub category: Vec<String>,
    #[serde(default, deserialize_with = "string_or_seq")]
    pub language: Vec<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub source_id: Option<String>,
    #[serde(rename = "pubDate", default, deserialize_with = "string_or_none")]
    pub pub_date: Option<String>,
    #[serde(rename = "fetchedAt")]
    pub fetched_at: DateTime<Utc>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Article {
    /// Overwrite this record with every field of `incoming`.
    /// Pass-through fields only the stored record has are kept.
    pub fn merge(&mut self, incoming: Article) {
        let Article {
            link,
            country,
            category,
            language,
            source_id,
            pub_date,
            fetched_at,
            status,
            extra,
        } = incoming;

        self.link = link;
        self.country = country;
        self.category = category;
        self.language = language;
        self.source_id = source_id;
        self.pub_date = pub_date;
        self.fetched_at = fetched_at;
        self.status = status;
        self.extra.extend(extra);
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.category.iter().any(|c| c == category)
    }

    pub fn has_language(&self, language: &str) -> bool {
        self.language.iter().any(|l| l == language)
    }
}

fn default_status() -> String {
    STATUS_ACTIVE.to_string()
}

// The provider is inconsistent: a single string, an array, or null.
// Anything that is not text is ignored rather than rejecting the article.
fn string_or_seq<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(value) => vec![value],
        Value::Array(values) => values
            .into_iter()
            .filter_map(|value| match value {
                Value::String(value) => Some(value),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn string_or_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(value) => Some(value),
        _ => None,
    })
}

/// Outcome of one batched upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertReport {
    pub inserted: u64,
    pub updated: u64,
}

/// Fields that can be enumerated for the filter picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistinctField {
    Category,
    Country,
    Language,
    Source,
}

impl DistinctField {
    /// Name of the field in the stored document
    pub fn field_name(&self) -> &'static str {
        match self {
            DistinctField::Category => "category",
            DistinctField::Country => "country",
            DistinctField::Language => "language",
            DistinctField::Source => "source_id",
        }
    }

    /// Whether the stored value is a sequence that has to be unwound
    pub fn is_sequence(&self) -> bool {
        matches!(self, DistinctField::Category | DistinctField::Language)
    }
}

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    /// Page numbers below 1 are clamped to 1. A zero limit falls back to the
    /// default page size and large limits are capped.
    pub fn new(page: u64, limit: u64) -> Self {
        let limit = match limit {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        };
        Self {
            page: page.max(1),
            limit,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// One page of query results plus the size of the full result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub results: Vec<T>,
}
