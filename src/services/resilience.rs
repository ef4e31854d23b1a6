// src/services/resilience.rs

//! Retry and quota policies for outbound calls.
//!
//! `ResilienceWrapper` combines a daily call quota with exponential backoff.
//! Every physical attempt first takes a slot from the quota; a quota
//! rejection ends the call at once because waiting does not free a slot.

use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use chrono::{Local, NaiveDate};
use tokio_retry2::strategy::ExponentialFactorBackoff;
use tokio_retry2::{Retry, RetryError};

use crate::error::{AppError, Result};
use crate::models::ResilienceConfig;

/// Exponential backoff without jitter or cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub max_attempts: u32,
}

impl BackoffPolicy {
    pub fn new(initial_delay: Duration, max_attempts: u32) -> Self {
        Self {
            initial_delay,
            max_attempts,
        }
    }

    /// Delays between attempts: `initial_delay`, doubled after each retry,
    /// one fewer than `max_attempts`.
    pub fn strategy(&self) -> impl Iterator<Item = Duration> + use<> {
        let initial_ms = u64::try_from(self.initial_delay.as_millis()).unwrap_or(u64::MAX);
        ExponentialFactorBackoff::from_millis(initial_ms, 2.0)
            .take(self.max_attempts.saturating_sub(1) as usize)
    }
}

/// Calls made on the stored date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaState {
    pub date: NaiveDate,
    pub count: u32,
}

/// Per-calendar-day call budget.
#[derive(Debug)]
pub struct DailyQuota {
    max_calls_per_day: u32,
    state: Mutex<QuotaState>,
}

impl DailyQuota {
    pub fn new(max_calls_per_day: u32) -> Self {
        Self::starting_on(max_calls_per_day, today())
    }

    pub fn starting_on(max_calls_per_day: u32, date: NaiveDate) -> Self {
        Self {
            max_calls_per_day,
            state: Mutex::new(QuotaState { date, count: 0 }),
        }
    }

    pub fn limit(&self) -> u32 {
        self.max_calls_per_day
    }

    /// Take one call slot for today.
    pub fn acquire(&self) -> Result<()> {
        self.acquire_on(today())
    }

    /// Take one call slot for `date`.
    ///
    /// Check and increment happen under one lock, so concurrent callers can
    /// never both take the last slot.
    pub fn acquire_on(&self, date: NaiveDate) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if state.date != date {
            log::debug!("Quota day rolled over from {} to {}", state.date, date);
            *state = QuotaState { date, count: 0 };
        }

        if state.count >= self.max_calls_per_day {
            log::warn!(
                "Daily quota of {} calls used up for {}",
                self.max_calls_per_day,
                state.date
            );
            return Err(AppError::QuotaExceeded {
                limit: self.max_calls_per_day,
            });
        }

        state.count += 1;
        Ok(())
    }

    /// Snapshot of the current counter.
    pub fn state(&self) -> QuotaState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Quota-checked, backoff-retried execution of a fallible async operation.
#[derive(Debug)]
pub struct ResilienceWrapper {
    backoff: BackoffPolicy,
    quota: DailyQuota,
}

impl ResilienceWrapper {
    pub fn new(backoff: BackoffPolicy, quota: DailyQuota) -> Self {
        Self { backoff, quota }
    }

    pub fn from_config(config: &ResilienceConfig) -> Self {
        Self::new(
            BackoffPolicy::new(config.initial_delay(), config.max_attempts),
            DailyQuota::new(config.max_calls_per_day),
        )
    }

    pub fn quota(&self) -> &DailyQuota {
        &self.quota
    }

    /// Run `operation` until it succeeds, fails for good, or runs out of
    /// attempts.
    pub async fn call<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.call_with(|| self.quota.acquire(), operation).await
    }

    async fn call_with<T, Q, F, Fut>(&self, mut take_slot: Q, mut operation: F) -> Result<T>
    where
        Q: FnMut() -> Result<()>,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.backoff.max_attempts.max(1);
        let attempts = AtomicU32::new(0);

        let action = || {
            let call = take_slot().map(|()| {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                (attempt, operation())
            });

            async move {
                let (attempt, pending) = call.map_err(RetryError::permanent)?;
                pending.await.map_err(|error| {
                    if !error.is_retryable() {
                        return RetryError::permanent(error);
                    }
                    if attempt < max_attempts {
                        log::warn!("Attempt {}/{} failed: {}", attempt, max_attempts, error);
                    }
                    RetryError::transient(error)
                })
            }
        };

        Retry::spawn(self.backoff.strategy(), action).await.map_err(|error| {
            if !error.is_retryable() {
                return error;
            }
            let attempts = attempts.load(Ordering::SeqCst);
            log::error!("Giving up after {} attempts: {}", attempts, error);
            AppError::RetriesExhausted {
                attempts,
                last: Box::new(error),
            }
        })
    }
}
