//! AWS Lambda entry point for the Guardian relay
//!
//! Deploy with `cargo lambda build --release --features lambda`.
//!
//! ## Environment Variables
//!
//! - `GUARDIAN_KEY`: Content API key (required)
//! - `SQS_QUEUE_URL`: Target queue URL (required)
//! - `AWS_REGION`: Region override
//! - `GUARDIAN_BASE_URL`: Content API base URL
//! - `MAX_CALLS_PER_DAY`, `MAX_ATTEMPTS`, `INITIAL_DELAY_MS`: Resilience policy
//! - `RUST_LOG`: Log level (e.g., `info`, `debug`)

use lambda_runtime::{Error as LambdaError, service_fn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the AWS Lambda function.
#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!("Guardian relay Lambda starting...");

    // One pipeline per container; warm invocations share its daily quota.
    let pipeline = guardian_relay::lambda::connect().await?;
    let pipeline = &pipeline;

    lambda_runtime::run(service_fn(move |event| async move {
        guardian_relay::lambda::handler(pipeline, event).await
    }))
    .await
}
