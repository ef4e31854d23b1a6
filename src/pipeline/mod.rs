//! Pipeline entry points for relay operations.
//!
//! - `transform`: Map a fetched record to its queue message
//! - `Pipeline`: Fetch, transform and publish records in order

pub mod transfer;
pub mod transform;

pub use transfer::{Pipeline, TransferSummary};
pub use transform::transform;
