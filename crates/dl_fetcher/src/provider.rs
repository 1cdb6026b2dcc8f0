use async_trait::async_trait;
use dl_core::{Error, RawArticle, Result};
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://newsdata.io/api/1";
pub const DEFAULT_LANGUAGE: &str = "en";

/// What to ask the provider for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub country: String,
    pub category: Option<String>,
    pub language: Option<String>,
}

impl FetchRequest {
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            category: None,
            language: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }

    pub fn language(&self) -> &str {
        self.language
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE)
    }
}

#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Returns the name of the provider
    fn name(&self) -> &str;

    /// Fetch the latest articles for a request. An empty list is not an error.
    async fn latest(&self, request: &FetchRequest) -> Result<Vec<RawArticle>>;
}

/// Client for the NewsData.io `latest` endpoint.
pub struct NewsDataClient {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl fmt::Debug for NewsDataClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsDataClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl NewsDataClient {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid provider URL {}: {}", base_url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join("latest")
            .map_err(|e| Error::Config(format!("Invalid provider URL {}: {}", base_url, e)))?;

        Ok(Self {
            client: Client::new(),
            endpoint,
            api_key,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl NewsProvider for NewsDataClient {
    fn name(&self) -> &str {
        "NewsData.io"
    }

    async fn latest(&self, request: &FetchRequest) -> Result<Vec<RawArticle>> {
        let mut params = vec![
            ("country", request.country.as_str()),
            ("apikey", self.api_key.as_str()),
            ("language", request.language()),
        ];
        if let Some(category) = request.category() {
            params.push(("category", category));
        }

        debug!("🌐 Requesting latest news from {} for {}", self.name(), request.country);
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .map(|body| provider_message(&body))
                .unwrap_or(text);
            return Err(Error::Provider(format!(
                "{} returned {}: {}",
                self.name(),
                status,
                message
            )));
        }

        parse_results(serde_json::from_str(&text)?)
    }
}

/// Pull the article list out of a response body. A body flagged as an error
/// becomes `Error::Provider`; a missing or null result list is empty.
fn parse_results(body: Value) -> Result<Vec<RawArticle>> {
    if body.get("status").and_then(Value::as_str) == Some("error") {
        return Err(Error::Provider(provider_message(&body)));
    }

    let results = match body {
        Value::Object(mut map) => map.remove("results"),
        _ => None,
    };

    Ok(match results {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(article) => Some(article),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn provider_message(body: &Value) -> String {
    body.pointer("/results/message")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}
