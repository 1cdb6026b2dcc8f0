use serde::{Deserialize, Serialize};
use crate::types::{Article, STATUS_ACTIVE};

/// Two-letter codes clients commonly send, mapped to the full names the
/// provider stores.
const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("en", "english"),
    ("es", "spanish"),
    ("fr", "french"),
    ("de", "german"),
];

/// Resolve a language code to its stored name. Anything not in the table is
/// returned as given.
pub fn language_name(code: &str) -> &str {
    LANGUAGE_NAMES
        .iter()
        .find(|(short, _)| *short == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

/// Filter parameters as a client sends them on `GET /api/news`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    pub country: Option<String>,
    pub category: Option<String>,
    pub language: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Inclusive bounds on `pubDate`, compared as raw strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl DateRange {
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, pub_date: Option<&str>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(date) = pub_date else {
            return false;
        };
        self.start.as_deref().map_or(true, |start| date >= start)
            && self.end.as_deref().map_or(true, |end| date <= end)
    }
}

/// The storage predicate. Every `None` clause imposes no constraint.
///
/// `category` and `language` match when the value is an element of the
/// stored sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArticleFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "DateRange::is_unbounded")]
    pub pub_date: DateRange,
}

impl ArticleFilter {
    /// A filter that matches every stored article.
    pub fn any() -> Self {
        Self::default()
    }

    /// Build the predicate for a client request.
    ///
    /// Empty strings count as absent. An omitted status defaults to
    /// `active`; an explicitly empty one drops the status clause.
    pub fn from_params(params: &FilterParams) -> Self {
        let status = match params.status.as_deref() {
            None => Some(STATUS_ACTIVE.to_string()),
            Some(status) => non_empty(Some(status)),
        };

        Self {
            country: non_empty(params.country.as_deref()),
            category: non_empty(params.category.as_deref()),
            language: non_empty(params.language.as_deref())
                .map(|code| language_name(&code).to_string()),
            source_id: non_empty(params.source.as_deref()),
            status,
            pub_date: DateRange {
                start: non_empty(params.start_date.as_deref()),
                end: non_empty(params.end_date.as_deref()),
            },
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Evaluate the predicate against one article.
    pub fn matches(&self, article: &Article) -> bool {
        self.country.as_deref().map_or(true, |c| article.country == c)
            && self.category.as_deref().map_or(true, |c| article.has_category(c))
            && self.language.as_deref().map_or(true, |l| article.has_language(l))
            && self
                .source_id
                .as_deref()
                .map_or(true, |s| article.source_id.as_deref() == Some(s))
            && self.status.as_deref().map_or(true, |s| article.status == s)
            && self.pub_date.contains(article.pub_date.as_deref())
    }
}

impl From<&FilterParams> for ArticleFilter {
    fn from(params: &FilterParams) -> Self {
        Self::from_params(params)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
