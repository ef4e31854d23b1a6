// src/models/mod.rs

//! Domain models for the relay.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod message;
mod query;
mod record;

// Re-export all public types
pub use config::{ApiConfig, Config, ResilienceConfig, Settings};
pub use message::{OutboundMessage, PublishReceipt};
pub use query::SearchQuery;
pub use record::{Category, FetchedRecord};
