//! Queue message and publish receipt.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Compact message relayed to the queue for every kept record.
///
/// Field order is the serialization order, so the encoded body is stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Publication time as `YYYY-MM-DDTHH:MM:SSZ`
    #[serde(rename = "webPublicationDate")]
    pub web_publication_date: String,

    #[serde(rename = "webTitle")]
    pub web_title: String,

    #[serde(rename = "webUrl")]
    pub web_url: String,

    /// Plain-text opening of the body, at most 1000 characters
    pub content_preview: String,
}

impl OutboundMessage {
    /// Canonical text encoding of the message body.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// What the queue reported back for one accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub message_id: String,

    /// Hex checksum of the body as received by the queue
    pub checksum: String,
}
