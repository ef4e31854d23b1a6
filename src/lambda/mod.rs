//! AWS Lambda handler for the relay.
//!
//! The pipeline is connected once per container and shared by every
//! invocation, so the daily quota spans warm invocations. Each invocation:
//! 1. Builds the search query from the payload
//! 2. Fetches the requested search results
//! 3. Publishes one verified message per record

use chrono::NaiveDate;
use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::error::Result;
use crate::models::{Config, SearchQuery, Settings};
use crate::pipeline::{Pipeline, TransferSummary};
use crate::services::{GuardianClient, QueueTransport, SearchApi, SqsTransport};

/// Lambda invocation payload.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// Search terms
    pub query: String,

    /// Only content published on or after this date (`YYYY-MM-DD`)
    #[serde(default)]
    pub date_from: Option<NaiveDate>,

    /// Only content published on or before this date (`YYYY-MM-DD`)
    #[serde(default)]
    pub date_to: Option<NaiveDate>,

    /// Maximum records to relay (default: 10, zero or less relays nothing)
    #[serde(default)]
    pub max_records: Option<i64>,
}

impl TransferRequest {
    fn to_query(&self) -> SearchQuery {
        SearchQuery {
            query: self.query.clone(),
            date_from: self.date_from,
            date_to: self.date_to,
            max_records: self
                .max_records
                .map_or(SearchQuery::DEFAULT_MAX_RECORDS, SearchQuery::records_limit),
        }
    }
}

/// Lambda response payload.
#[derive(Debug, Default, Serialize)]
pub struct TransferResponse {
    /// Whether every fetched record was published
    pub success: bool,

    /// Records fetched from the content API
    pub fetched: usize,

    /// Messages accepted and verified by the queue
    pub published: usize,

    /// Error message if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl From<TransferSummary> for TransferResponse {
    fn from(summary: TransferSummary) -> Self {
        Self {
            success: true,
            fetched: summary.fetched,
            published: summary.published,
            ..Default::default()
        }
    }
}

/// Connect the production pipeline from the Lambda environment.
pub async fn connect() -> Result<Pipeline<GuardianClient, SqsTransport>> {
    let settings = Settings::from_env()?;
    let config = load_lambda_config();
    Pipeline::connect(&config, &settings).await
}

/// Main Lambda handler function.
#[instrument(skip(pipeline, event))]
pub async fn handler<A: SearchApi, Q: QueueTransport>(
    pipeline: &Pipeline<A, Q>,
    event: LambdaEvent<TransferRequest>,
) -> std::result::Result<TransferResponse, LambdaError> {
    let (request, _context) = event.into_parts();
    Ok(process(pipeline, request).await)
}

/// Run one transfer and report the outcome in the response body.
pub async fn process<A: SearchApi, Q: QueueTransport>(
    pipeline: &Pipeline<A, Q>,
    request: TransferRequest,
) -> TransferResponse {
    let start = std::time::Instant::now();

    info!(
        "Starting transfer: query={:?}, from={:?}, to={:?}, max={:?}",
        request.query, request.date_from, request.date_to, request.max_records
    );

    let mut response = match pipeline.run(&request.to_query()).await {
        Ok(summary) => {
            info!(
                "Transfer completed: {} published of {} fetched",
                summary.published, summary.fetched
            );
            TransferResponse::from(summary)
        }
        Err(e) => {
            error!("Transfer failed: {}", e);
            TransferResponse {
                error: Some(e.to_string()),
                ..Default::default()
            }
        }
    };

    let quota = pipeline.resilience().quota();
    let usage = quota.state();
    info!(
        "Daily quota: {}/{} calls used on {}",
        usage.count,
        quota.limit(),
        usage.date
    );

    response.execution_time_ms = start.elapsed().as_millis() as u64;
    response
}

/// Load configuration suitable for the Lambda environment.
fn load_lambda_config() -> Config {
    let mut config = Config::default();

    if let Ok(base_url) = std::env::var("GUARDIAN_BASE_URL") {
        config.api.base_url = base_url;
    }

    if let Ok(max_calls) = std::env::var("MAX_CALLS_PER_DAY") {
        if let Ok(n) = max_calls.parse() {
            config.resilience.max_calls_per_day = n;
        }
    }

    if let Ok(attempts) = std::env::var("MAX_ATTEMPTS") {
        if let Ok(n) = attempts.parse() {
            config.resilience.max_attempts = n;
        }
    }

    if let Ok(delay) = std::env::var("INITIAL_DELAY_MS") {
        if let Ok(ms) = delay.parse() {
            config.resilience.initial_delay_ms = ms;
        }
    }

    config
}
