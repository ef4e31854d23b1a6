//! Records returned by the content API.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};

/// An id/name pair the API uses for sections and pillars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// One content item from a search page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedRecord {
    /// API content identifier (a path such as `world/2022/oct/21/...`)
    pub id: String,

    /// Content type, e.g. `article` or `liveblog`
    pub content_type: String,

    pub section: Category,

    pub published_at: DateTime<Utc>,

    pub title: String,

    /// Canonical public URL
    pub web_url: String,

    pub api_url: String,

    pub is_hosted: bool,

    pub pillar: Option<Category>,

    /// Raw HTML body, present when requested via `show-fields=body`
    pub body: Option<String>,
}

/// Wire shape of a result item.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiItem {
    id: String,
    #[serde(rename = "type")]
    content_type: String,
    section_id: String,
    section_name: String,
    web_publication_date: String,
    web_title: String,
    web_url: String,
    api_url: String,
    is_hosted: bool,
    #[serde(default)]
    pillar_id: Option<String>,
    #[serde(default)]
    pillar_name: Option<String>,
    #[serde(default)]
    fields: Option<ApiFields>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiFields {
    #[serde(default)]
    body: Option<String>,
}

impl FetchedRecord {
    /// Build a record from one raw result item.
    ///
    /// Any failure is an `AppError::Record` naming the item id (or
    /// `unknown`), so callers can log it and move on.
    pub fn from_api_item(item: &Value) -> Result<Self> {
        let id = item
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();

        let raw: ApiItem =
            ApiItem::deserialize(item).map_err(|e| AppError::record(id.as_str(), e))?;
        let published_at = parse_timestamp(&raw.web_publication_date)
            .map_err(|e| AppError::record(id.as_str(), e))?;

        let pillar = match (raw.pillar_id, raw.pillar_name) {
            (Some(id), Some(name)) => Some(Category { id, name }),
            _ => None,
        };

        Ok(Self {
            id: raw.id,
            content_type: raw.content_type,
            section: Category {
                id: raw.section_id,
                name: raw.section_name,
            },
            published_at,
            title: raw.web_title,
            web_url: raw.web_url,
            api_url: raw.api_url,
            is_hosted: raw.is_hosted,
            pillar,
            body: raw.fields.and_then(|f| f.body),
        })
    }
}

/// Parse an ISO-8601 timestamp. Values without an offset are taken as UTC.
fn parse_timestamp(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid webPublicationDate '{raw}': {e}"))
}
