// src/services/publisher.rs

//! Verified queue publishing.
//!
//! The body is encoded once, hashed, and sent as-is. The checksum the queue
//! reports for what it received must match the local one, otherwise the
//! publish fails with an integrity error.

use async_trait::async_trait;
use aws_sdk_sqs::Client;
use md5::{Digest, Md5};

use crate::error::{AppError, Result};
use crate::models::{OutboundMessage, PublishReceipt, Settings};

/// What a queue transport returns for one send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOutcome {
    pub message_id: Option<String>,
    /// Hex MD5 of the body as seen by the queue
    pub body_md5: Option<String>,
}

/// A queue that accepts a single text body per call.
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Send one body. Failures must be reported as `AppError::Delivery`.
    async fn send(&self, body: &str) -> Result<SendOutcome>;
}

/// AWS SQS transport.
pub struct SqsTransport {
    client: Client,
    queue_url: String,
}

impl SqsTransport {
    pub fn new(client: Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    /// Build a transport from the default AWS credential chain.
    ///
    /// `settings.region` overrides the region the chain would pick.
    pub async fn from_settings(settings: &Settings) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &settings.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        let config = loader.load().await;
        Self::new(Client::new(&config), &settings.queue_url)
    }
}

#[async_trait]
impl QueueTransport for SqsTransport {
    async fn send(&self, body: &str) -> Result<SendOutcome> {
        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| {
                AppError::delivery(format!(
                    "failed to send SQS message: {}",
                    e.into_service_error()
                ))
            })?;

        Ok(SendOutcome {
            message_id: output.message_id().map(str::to_string),
            body_md5: output.md5_of_message_body().map(str::to_string),
        })
    }
}

/// Lowercase hex MD5 of `bytes`.
pub fn body_checksum(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}

/// Publishes messages and checks they arrived unmodified.
pub struct VerifiedPublisher<Q> {
    transport: Q,
}

impl<Q: QueueTransport> VerifiedPublisher<Q> {
    pub fn new(transport: Q) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Q {
        &self.transport
    }

    /// Send one message; exactly one transport call, no retry.
    pub async fn publish(&self, message: &OutboundMessage) -> Result<PublishReceipt> {
        let body = message.to_json()?;
        let expected = body_checksum(body.as_bytes());

        let outcome = self.transport.send(&body).await?;

        let actual = outcome.body_md5.unwrap_or_default();
        if !actual.eq_ignore_ascii_case(&expected) {
            log::error!(
                "Checksum mismatch for '{}': expected {}, got {}",
                message.web_url,
                expected,
                actual
            );
            return Err(AppError::Integrity { expected, actual });
        }

        let message_id = outcome
            .message_id
            .ok_or_else(|| AppError::delivery("queue returned no message id"))?;

        log::debug!("Published '{}' as message {}", message.web_url, message_id);
        Ok(PublishReceipt {
            message_id,
            checksum: actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Records sent bodies and answers with a configurable checksum.
    struct FakeQueue {
        sent: Mutex<Vec<String>>,
        reply: Box<dyn Fn(&str) -> Result<SendOutcome> + Send + Sync>,
    }

    impl FakeQueue {
        fn new(reply: impl Fn(&str) -> Result<SendOutcome> + Send + Sync + 'static) -> Self {
            Self {
                sent: Mutex::default(),
                reply: Box::new(reply),
            }
        }

        fn honest() -> Self {
            Self::new(|body| {
                Ok(SendOutcome {
                    message_id: Some("12345".into()),
                    body_md5: Some(body_checksum(body.as_bytes())),
                })
            })
        }
    }

    #[async_trait]
    impl QueueTransport for FakeQueue {
        async fn send(&self, body: &str) -> Result<SendOutcome> {
            self.sent.lock().unwrap().push(body.to_string());
            (self.reply)(body)
        }
    }

    fn message() -> OutboundMessage {
        OutboundMessage {
            web_publication_date: "2022-10-21T14:06:14Z".into(),
            web_title: "Gritters stopped by 200 cars double parked".into(),
            web_url: "https://www.theguardian.com/uk-news/2025/jan/11/gritters".into(),
            content_preview: "Council gritters were unable to pass".into(),
        }
    }

    #[test]
    fn checksum_is_lowercase_hex_md5() {
        assert_eq!(body_checksum(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(body_checksum(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[tokio::test]
    async fn publish_returns_receipt_when_checksums_match() {
        let publisher = VerifiedPublisher::new(FakeQueue::honest());
        let receipt = publisher.publish(&message()).await.unwrap();

        let body = message().to_json().unwrap();
        assert_eq!(receipt.message_id, "12345");
        assert_eq!(receipt.checksum, body_checksum(body.as_bytes()));
        assert_eq!(*publisher.transport.sent.lock().unwrap(), vec![body]);
    }

    #[tokio::test]
    async fn uppercase_checksum_is_accepted() {
        let publisher = VerifiedPublisher::new(FakeQueue::new(|body| {
            Ok(SendOutcome {
                message_id: Some("1".into()),
                body_md5: Some(body_checksum(body.as_bytes()).to_uppercase()),
            })
        }));
        assert!(publisher.publish(&message()).await.is_ok());
    }

    #[tokio::test]
    async fn mismatched_checksum_is_an_integrity_error() {
        let publisher = VerifiedPublisher::new(FakeQueue::new(|_| {
            Ok(SendOutcome {
                message_id: Some("12345".into()),
                body_md5: Some("wrong_md5".into()),
            })
        }));

        let err = publisher.publish(&message()).await.unwrap_err();
        let body = message().to_json().unwrap();
        let expected = body_checksum(body.as_bytes());
        assert_eq!(
            err.to_string(),
            format!("Checksum mismatch: expected {expected}, got wrong_md5")
        );
    }

    #[tokio::test]
    async fn missing_checksum_is_an_integrity_error() {
        let publisher = VerifiedPublisher::new(FakeQueue::new(|_| {
            Ok(SendOutcome {
                message_id: Some("12345".into()),
                body_md5: None,
            })
        }));
        assert!(matches!(
            publisher.publish(&message()).await,
            Err(AppError::Integrity { .. })
        ));
    }

    #[tokio::test]
    async fn transport_failure_is_a_delivery_error_sent_once() {
        let publisher =
            VerifiedPublisher::new(FakeQueue::new(|_| Err(AppError::delivery("access denied"))));

        assert!(matches!(
            publisher.publish(&message()).await,
            Err(AppError::Delivery(_))
        ));
        assert_eq!(publisher.transport.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_message_id_is_a_delivery_error() {
        let publisher = VerifiedPublisher::new(FakeQueue::new(|body| {
            Ok(SendOutcome {
                message_id: None,
                body_md5: Some(body_checksum(body.as_bytes())),
            })
        }));
        assert!(matches!(
            publisher.publish(&message()).await,
            Err(AppError::Delivery(_))
        ));
    }
}
