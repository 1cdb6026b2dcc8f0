use chrono::{DateTime, Utc};
use serde_json::Value;
use crate::types::{Article, RawArticle, STATUS_ACTIVE};
use crate::{Error, Result};

/// Shape a raw provider article into the stored record.
///
/// `country`, `fetchedAt` and `status` are set (overwriting whatever the
/// provider sent); every other field passes through untouched. The only
/// rejection is an article without a usable `link`, since it cannot be keyed.
pub fn normalize(
    mut raw: RawArticle,
    country: &str,
    fetched_at: DateTime<Utc>,
) -> Result<Article> {
    match raw.get("link") {
        Some(Value::String(link)) if !link.is_empty() => {}
        _ => return Err(Error::InvalidArticle("article has no link".to_string())),
    }

    raw.insert("country".to_string(), Value::String(country.to_string()));
    raw.insert("fetchedAt".to_string(), serde_json::to_value(fetched_at)?);
    raw.insert("status".to_string(), Value::String(STATUS_ACTIVE.to_string()));

    serde_json::from_value(Value::Object(raw)).map_err(|e| Error::InvalidArticle(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn raw(value: Value) -> RawArticle {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_normalize_tags_article() {
        let fetched_at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let article = normalize(
            raw(json!({
                "link": "https://example.com/story",
                "title": "Story",
                "country": ["united states of america"],
                "category": ["top"],
                "language": "english",
                "source_id": "cnn",
                "pubDate": "2025-03-01 11:00:00",
                "status": "whatever"
            })),
            "us",
            fetched_at,
        )
        .unwrap();

        assert_eq!(article.country, "us");
        assert_eq!(article.status, STATUS_ACTIVE);
        assert_eq!(article.fetched_at, fetched_at);
        assert_eq!(article.language, vec!["english"]);
        assert_eq!(article.pub_date.as_deref(), Some("2025-03-01 11:00:00"));
        assert_eq!(article.extra["title"], "Story");
    }

    #[test]
    fn test_normalize_keeps_articles_with_odd_field_types() {
        let article = normalize(
            raw(json!({
                "link": "https://example.com/odd",
                "source_id": 42,
                "pubDate": 1735689600,
                "category": "top",
                "title": ["not", "a", "string"]
            })),
            "us",
            Utc::now(),
        )
        .unwrap();

        assert_eq!(article.link, "https://example.com/odd");
        assert_eq!(article.source_id, None);
        assert_eq!(article.pub_date, None);
        assert_eq!(article.category, vec!["top"]);
        assert_eq!(article.extra["title"], json!(["not", "a", "string"]));
    }

    #[test]
    fn test_normalize_rejects_missing_link() {
        let result = normalize(raw(json!({ "title": "No link" })), "us", Utc::now());
        assert!(matches!(result, Err(Error::InvalidArticle(_))));

        let result = normalize(raw(json!({ "link": "" })), "us", Utc::now());
        assert!(matches!(result, Err(Error::InvalidArticle(_))));
    }
}
