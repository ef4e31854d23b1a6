// src/services/fetcher.rs

//! Paginated search fetcher.
//!
//! Walks the search result pages through the resilience wrapper and
//! accumulates records in API order, never more than requested.

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{FetchedRecord, SearchQuery};
use crate::services::guardian::{MAX_PAGE_SIZE, PageRequest, SearchApi};
use crate::services::resilience::ResilienceWrapper;

/// Status value of a successful search envelope.
const STATUS_OK: &str = "ok";

/// Validated view of one page envelope.
struct Page<'a> {
    results: &'a [Value],
    total_pages: Option<u64>,
}

impl<'a> Page<'a> {
    fn parse(document: &'a Value) -> Result<Self> {
        let envelope = document
            .get("response")
            .ok_or_else(|| AppError::malformed("'response' key not found"))?;

        let status = envelope.get("status").and_then(Value::as_str);
        if status != Some(STATUS_OK) {
            let status = status.unwrap_or("missing").to_string();
            log::error!("API returned a non-ok status: {}", status);
            return Err(AppError::UpstreamStatus(status));
        }

        let results = envelope
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| AppError::malformed("'results' list not found in response"))?;

        Ok(Self {
            results,
            total_pages: envelope.get("pages").and_then(Value::as_u64),
        })
    }
}

/// Fetches search results page by page.
pub struct PaginatedFetcher<A> {
    api: A,
    resilience: ResilienceWrapper,
}

impl<A: SearchApi> PaginatedFetcher<A> {
    pub fn new(api: A, resilience: ResilienceWrapper) -> Self {
        Self { api, resilience }
    }

    pub fn resilience(&self) -> &ResilienceWrapper {
        &self.resilience
    }

    /// Fetch up to `query.max_records` records.
    ///
    /// Items that cannot be turned into records are logged and skipped.
    pub async fn fetch(&self, query: &SearchQuery) -> Result<Vec<FetchedRecord>> {
        if query.max_records == 0 {
            return Ok(Vec::new());
        }
        query.validate()?;

        log::info!(
            "Fetching up to {} records for '{}' (from {:?}, to {:?})",
            query.max_records,
            query.query,
            query.date_from,
            query.date_to
        );

        let mut records: Vec<FetchedRecord> = Vec::with_capacity(query.max_records);
        let mut skipped = 0usize;
        let mut page_number: u64 = 1;

        while records.len() < query.max_records {
            let page_size = (query.max_records - records.len()).min(MAX_PAGE_SIZE);
            let request = PageRequest::new(query, page_number, page_size);

            let document = self
                .resilience
                .call(|| self.api.search_page(&request))
                .await?;
            let page = Page::parse(&document)?;

            if page.results.is_empty() {
                log::info!("No results returned on page {}", page_number);
                break;
            }

            log::debug!(
                "Processing {} results from page {}",
                page.results.len(),
                page_number
            );

            for item in page.results {
                match FetchedRecord::from_api_item(item) {
                    Ok(record) => records.push(record),
                    Err(error) => {
                        skipped += 1;
                        log::warn!("Skipping result: {}", error);
                        continue;
                    }
                }
                if records.len() >= query.max_records {
                    log::debug!("Reached requested limit of {} records", query.max_records);
                    break;
                }
            }

            match page.total_pages {
                Some(total) if page_number < total => page_number += 1,
                _ => {
                    log::debug!("Last page reached or page count missing");
                    break;
                }
            }
        }

        log::info!("Retrieved {} records ({} skipped)", records.len(), skipped);
        Ok(records)
    }
}
