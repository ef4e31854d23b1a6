//! Search query input.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Parameters of one fetch operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text search terms
    pub query: String,

    /// Only content published on or after this date
    #[serde(default)]
    pub date_from: Option<NaiveDate>,

    /// Only content published on or before this date
    #[serde(default)]
    pub date_to: Option<NaiveDate>,

    /// Upper bound on the number of records returned
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

fn default_max_records() -> usize {
    SearchQuery::DEFAULT_MAX_RECORDS
}

impl SearchQuery {
    pub const DEFAULT_MAX_RECORDS: usize = 10;

    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            date_from: None,
            date_to: None,
            max_records: Self::DEFAULT_MAX_RECORDS,
        }
    }

    pub fn date_from(mut self, date: NaiveDate) -> Self {
        self.date_from = Some(date);
        self
    }

    pub fn date_to(mut self, date: NaiveDate) -> Self {
        self.date_to = Some(date);
        self
    }

    pub fn max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records;
        self
    }

    /// Record limit for a signed count from an outer boundary.
    ///
    /// Zero or negative asks for nothing.
    pub fn records_limit(requested: i64) -> usize {
        usize::try_from(requested.max(0)).unwrap_or(usize::MAX)
    }

    /// Reject input the content API would only answer with garbage.
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(AppError::validation("search query is empty"));
        }
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(AppError::validation(format!(
                    "date_from {from} is after date_to {to}"
                )));
            }
        }
        Ok(())
    }
}
