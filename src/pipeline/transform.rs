// src/pipeline/transform.rs

//! Record to queue message mapping.

use crate::models::{FetchedRecord, OutboundMessage};
use crate::utils::text::{html_to_text, truncate_at_word};

/// Wire format of `webPublicationDate`.
pub const PUBLICATION_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Longest preview in characters.
pub const PREVIEW_MAX_CHARS: usize = 1000;

/// Build the queue message for one record.
pub fn transform(record: &FetchedRecord) -> OutboundMessage {
    OutboundMessage {
        web_publication_date: record
            .published_at
            .format(PUBLICATION_DATE_FORMAT)
            .to_string(),
        web_title: record.title.clone(),
        web_url: record.web_url.clone(),
        content_preview: content_preview(record.body.as_deref()),
    }
}

/// Plain-text preview of an HTML body; empty when there is no body.
pub fn content_preview(body: Option<&str>) -> String {
    body.map(|html| truncate_at_word(&html_to_text(html), PREVIEW_MAX_CHARS))
        .unwrap_or_default()
}
