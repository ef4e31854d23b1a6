// src/pipeline/transfer.rs

//! Fetch → transform → publish, one record at a time.

use crate::error::Result;
use crate::models::{Config, OutboundMessage, PublishReceipt, SearchQuery, Settings};
use crate::services::{
    GuardianClient, PaginatedFetcher, QueueTransport, ResilienceWrapper, SearchApi, SqsTransport,
    VerifiedPublisher,
};

use super::transform::transform;

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct TransferSummary {
    pub fetched: usize,
    pub published: usize,
    pub receipts: Vec<PublishReceipt>,
}

/// Sequential relay from the content API to the queue.
pub struct Pipeline<A, Q> {
    fetcher: PaginatedFetcher<A>,
    publisher: VerifiedPublisher<Q>,
}

impl Pipeline<GuardianClient, SqsTransport> {
    /// Wire the Guardian client and SQS transport from startup configuration.
    pub async fn connect(config: &Config, settings: &Settings) -> Result<Self> {
        config.validate()?;
        let client = GuardianClient::new(&config.api, settings.api_key.as_str())?;
        let resilience = ResilienceWrapper::from_config(&config.resilience);
        let fetcher = PaginatedFetcher::new(client, resilience);
        let transport = SqsTransport::from_settings(settings).await;
        log::info!("Relaying to queue {}", settings.queue_url);
        Ok(Self::new(fetcher, VerifiedPublisher::new(transport)))
    }
}

impl<A: SearchApi, Q: QueueTransport> Pipeline<A, Q> {
    pub fn new(fetcher: PaginatedFetcher<A>, publisher: VerifiedPublisher<Q>) -> Self {
        Self { fetcher, publisher }
    }

    /// Retry and quota state shared by every run of this pipeline.
    pub fn resilience(&self) -> &ResilienceWrapper {
        self.fetcher.resilience()
    }

    /// Relay every record matching `query`.
    ///
    /// The first fetch or publish error aborts the run; messages already
    /// published stay published.
    pub async fn run(&self, query: &SearchQuery) -> Result<TransferSummary> {
        let records = self.fetcher.fetch(query).await?;

        let mut summary = TransferSummary {
            fetched: records.len(),
            ..TransferSummary::default()
        };

        for record in &records {
            let message = transform(record);
            let receipt = self.publisher.publish(&message).await.inspect_err(|e| {
                log::error!(
                    "Publishing '{}' failed after {} of {} messages: {}",
                    record.id,
                    summary.published,
                    summary.fetched,
                    e
                );
            })?;
            summary.published += 1;
            summary.receipts.push(receipt);
        }

        log::info!(
            "Transferred {} of {} records",
            summary.published,
            summary.fetched
        );
        Ok(summary)
    }

    /// Fetch and transform without publishing anything.
    pub async fn preview(&self, query: &SearchQuery) -> Result<Vec<OutboundMessage>> {
        let records = self.fetcher.fetch(query).await?;
        Ok(records.iter().map(transform).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;
    use crate::error::AppError;
    use crate::services::guardian::PageRequest;
    use crate::services::publisher::{SendOutcome, body_checksum};
    use crate::services::resilience::{BackoffPolicy, DailyQuota, ResilienceWrapper};

    struct OnePageApi(Value);

    #[async_trait]
    impl SearchApi for OnePageApi {
        async fn search_page(&self, _request: &PageRequest<'_>) -> Result<Value> {
            Ok(self.0.clone())
        }
    }

    /// Accepts bodies until `fail_at`, then corrupts the checksum.
    struct CountingQueue {
        sent: Mutex<Vec<String>>,
        fail_at: Option<usize>,
    }

    #[async_trait]
    impl QueueTransport for CountingQueue {
        async fn send(&self, body: &str) -> Result<SendOutcome> {
            let mut sent = self.sent.lock().unwrap();
            sent.push(body.to_string());
            let corrupt = self.fail_at == Some(sent.len());
            Ok(SendOutcome {
                message_id: Some(format!("m{}", sent.len())),
                body_md5: Some(if corrupt {
                    "0".repeat(32)
                } else {
                    body_checksum(body.as_bytes())
                }),
            })
        }
    }

    fn results(n: usize) -> Value {
        let items: Vec<Value> = (0..n)
            .map(|i| {
                json!({
                    "id": format!("a/{i}"),
                    "type": "article",
                    "sectionId": "s",
                    "sectionName": "S",
                    "webPublicationDate": "2024-05-01T08:00:00Z",
                    "webTitle": format!("T{i}"),
                    "webUrl": format!("https://www.theguardian.com/a/{i}"),
                    "apiUrl": format!("https://content.guardianapis.com/a/{i}"),
                    "isHosted": false,
                    "fields": { "body": format!("<p>Body {i}</p>") }
                })
            })
            .collect();
        json!({ "response": { "status": "ok", "pages": 1, "results": items } })
    }

    fn pipeline(n: usize, fail_at: Option<usize>) -> Pipeline<OnePageApi, CountingQueue> {
        let resilience = ResilienceWrapper::new(
            BackoffPolicy::new(Duration::from_millis(1), 2),
            DailyQuota::new(10),
        );
        Pipeline::new(
            PaginatedFetcher::new(OnePageApi(results(n)), resilience),
            VerifiedPublisher::new(CountingQueue {
                sent: Mutex::default(),
                fail_at,
            }),
        )
    }

    fn sent(pipeline: &Pipeline<OnePageApi, CountingQueue>) -> Vec<Value> {
        pipeline
            .publisher
            .transport()
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(|body| serde_json::from_str(body).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn publishes_every_record_in_order() {
        let pipeline = pipeline(3, None);
        let summary = pipeline.run(&SearchQuery::new("x")).await.unwrap();

        assert_eq!(summary.fetched, 3);
        assert_eq!(summary.published, 3);
        assert_eq!(summary.receipts[2].message_id, "m3");

        let titles: Vec<Value> = sent(&pipeline)
            .into_iter()
            .map(|v| v["webTitle"].clone())
            .collect();
        assert_eq!(titles, vec![json!("T0"), json!("T1"), json!("T2")]);
        assert_eq!(sent(&pipeline)[0]["content_preview"], "Body 0");
    }

    #[tokio::test]
    async fn integrity_failure_aborts_the_run() {
        let pipeline = pipeline(4, Some(2));
        let result = pipeline.run(&SearchQuery::new("x")).await;

        assert!(matches!(result, Err(AppError::Integrity { .. })));
        assert_eq!(sent(&pipeline).len(), 2);
    }

    #[tokio::test]
    async fn preview_publishes_nothing() {
        let pipeline = pipeline(2, None);
        let messages = pipeline.preview(&SearchQuery::new("x")).await.unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].web_publication_date, "2024-05-01T08:00:00Z");
        assert!(sent(&pipeline).is_empty());
    }
}
