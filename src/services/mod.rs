//! Service layer for the relay.
//!
//! This module contains the business logic for:
//! - Retry and daily quota around outbound calls (`ResilienceWrapper`)
//! - Content API access (`GuardianClient`)
//! - Paginated fetching (`PaginatedFetcher`)
//! - Verified queue publishing (`VerifiedPublisher`)

pub mod fetcher;
pub mod guardian;
pub mod publisher;
pub mod resilience;

pub use fetcher::PaginatedFetcher;
pub use guardian::{GuardianClient, PageRequest, SearchApi};
pub use publisher::{QueueTransport, SendOutcome, SqsTransport, VerifiedPublisher};
pub use resilience::{BackoffPolicy, DailyQuota, ResilienceWrapper};
