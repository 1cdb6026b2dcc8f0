use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use dl_core::{
    Article, ArticleFilter, ArticleStorage, DistinctField, FilterParams, Page, Pagination,
    DEFAULT_PAGE_SIZE,
};
use dl_fetcher::{FetchRequest, IngestReport};
use dl_storage::query_articles;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use crate::{ApiError, AppState};

const SAMPLE_SIZE: usize = 5;

/// Query string of `GET /api/news`.
#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    #[serde(flatten)]
    pub filter: FilterParams,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl NewsQuery {
    pub fn pagination(&self) -> Result<Pagination, ApiError> {
        let page = parse_number("page", self.page.as_deref(), 1)?;
        let limit = parse_number("limit", self.limit.as_deref(), DEFAULT_PAGE_SIZE)?;
        Ok(Pagination::new(page, limit))
    }
}

fn parse_number(name: &str, value: Option<&str>, default: u64) -> Result<u64, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| {
            ApiError::BadRequest(format!("{} must be a non-negative integer, got {:?}", name, v))
        }),
    }
}

#[derive(Debug, Serialize)]
pub struct NewsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub page: Page<Article>,
}

pub async fn list_news(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NewsQuery>,
) -> Result<Json<NewsResponse>, ApiError> {
    let pagination = query.pagination()?;
    let filter = ArticleFilter::from_params(&query.filter);
    debug!("Query: {}", serde_json::to_string(&filter).unwrap_or_default());

    let page = query_articles(state.storage.as_ref(), &filter, pagination).await?;
    Ok(Json(NewsResponse { success: true, page }))
}

/// Body of `POST /api/news/fetch`.
#[derive(Debug, Default, Deserialize)]
pub struct FetchBody {
    pub country: Option<String>,
    pub category: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FetchResponse {
    pub success: bool,
    pub message: &'static str,
    pub result: Option<IngestReport>,
}

pub async fn fetch_news(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FetchBody>, JsonRejection>,
) -> Result<Json<FetchResponse>, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let country = body
        .country
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Country is required".to_string()))?;

    let request = FetchRequest {
        country,
        category: body.category,
        language: body.language,
    };
    let result = state.ingestor.fetch_and_store(&request).await?;

    Ok(Json(FetchResponse {
        success: true,
        message: "News fetched and stored successfully",
        result,
    }))
}

#[derive(Debug, Serialize)]
pub struct Filters {
    pub categories: Vec<String>,
    pub countries: Vec<String>,
    pub languages: Vec<String>,
    pub sources: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FiltersResponse {
    pub success: bool,
    pub filters: Filters,
}

pub async fn list_filters(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FiltersResponse>, ApiError> {
    let storage = state.storage.as_ref();
    let (categories, countries, languages, sources) = tokio::try_join!(
        storage.distinct_values(DistinctField::Category),
        storage.distinct_values(DistinctField::Country),
        storage.distinct_values(DistinctField::Language),
        storage.distinct_values(DistinctField::Source),
    )?;

    Ok(Json(FiltersResponse {
        success: true,
        filters: Filters {
            categories,
            countries,
            languages,
            sources,
        },
    }))
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "DevLook News API", "status": "running" }))
}

#[derive(Debug, Serialize)]
pub struct DebugResponse {
    pub total: u64,
    pub sample: Vec<Article>,
}

pub async fn debug_all(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DebugResponse>, ApiError> {
    let storage = state.storage.as_ref();
    let any = ArticleFilter::any();
    let (sample, total) = tokio::try_join!(
        storage.sample(SAMPLE_SIZE),
        storage.count_articles(&any),
    )?;
    Ok(Json(DebugResponse { total, sample }))
}
