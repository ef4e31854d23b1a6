// src/services/guardian.rs

//! Guardian content API client.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{ApiConfig, SearchQuery};
use crate::utils::http;

/// Largest page the search endpoint serves.
pub const MAX_PAGE_SIZE: usize = 50;

/// Date format of the `from-date` / `to-date` parameters.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// One page of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest<'a> {
    pub query: &'a str,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// 1-based page number
    pub page: u64,
    pub page_size: usize,
}

impl<'a> PageRequest<'a> {
    pub fn new(query: &'a SearchQuery, page: u64, page_size: usize) -> Self {
        Self {
            query: &query.query,
            date_from: query.date_from,
            date_to: query.date_to,
            page,
            page_size,
        }
    }

    /// Query-string parameters, API key excluded.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("format", "json".to_string()),
            ("q", self.query.to_string()),
            ("show-fields", "body".to_string()),
        ];
        if let Some(date) = self.date_from {
            params.push(("from-date", date.format(DATE_FORMAT).to_string()));
        }
        if let Some(date) = self.date_to {
            params.push(("to-date", date.format(DATE_FORMAT).to_string()));
        }
        params.push(("page", self.page.to_string()));
        params.push(("page-size", self.page_size.to_string()));
        params
    }
}

/// Source of raw search pages.
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// Fetch one page and return the decoded JSON document untouched.
    ///
    /// Transport failures must surface as retryable errors; a body that is
    /// not JSON at all is a malformed response.
    async fn search_page(&self, request: &PageRequest<'_>) -> Result<Value>;
}

/// HTTP client for the Guardian `/search` endpoint.
pub struct GuardianClient {
    client: Client,
    search_url: Url,
    api_key: String,
}

impl GuardianClient {
    /// Create a client from API settings and the secret key.
    pub fn new(config: &ApiConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = http::create_async_client(config)?;
        Self::with_client(client, &config.base_url, api_key)
    }

    /// Create a client around an existing `reqwest::Client`.
    pub fn with_client(client: Client, base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let search_url = Url::parse(&format!("{}/search", base_url.trim_end_matches('/')))?;
        log::debug!("Guardian client targeting {}", search_url);

        Ok(Self {
            client,
            search_url,
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl SearchApi for GuardianClient {
    async fn search_page(&self, request: &PageRequest<'_>) -> Result<Value> {
        log::debug!(
            "Requesting page {} with page-size {}",
            request.page,
            request.page_size
        );

        let response = self
            .client
            .get(self.search_url.clone())
            .header("api-key", &self.api_key)
            .query(&request.params())
            .send()
            .await?
            .error_for_status()?;

        log::debug!("Received response with status code {}", response.status());

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::malformed(format!("response body is not JSON: {e}")))
    }
}
