//! Request pacing and retry for the Seller Center client.
//!
//! [`RateLimiter`] spaces outbound calls by a fixed minimum interval, shared
//! across concurrent workers. [`retry_with_backoff`] wraps a single product
//! call and retries transient failures (network faults, 429, 5xx) with
//! exponential back-off and jitter. Retries never span products.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::SellerCenterError;

/// Enforces a minimum interval between consecutive outbound requests.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Waits until the next request slot is free, then claims it.
    ///
    /// Callers are served in lock order; the first call never waits.
    pub async fn acquire(&self) {
        if self.interval.is_zero() {
            return;
        }

        let mut next_slot = self.next_slot.lock().await;
        if let Some(slot) = *next_slot {
            if slot > Instant::now() {
                tokio::time::sleep_until(slot).await;
            }
        }
        *next_slot = Some(Instant::now() + self.interval);
    }
}

/// Returns `true` for errors worth retrying after a back-off delay.
///
/// Retriable: timeouts, connection failures, HTTP 429 and 5xx.
/// Not retriable: other 4xx statuses, signature and encoding errors.
pub(crate) fn is_retriable(err: &SellerCenterError) -> bool {
    match err {
        SellerCenterError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        SellerCenterError::Status { status, .. } => *status == 429 || (500..600).contains(status),
        SellerCenterError::Signature(_)
        | SellerCenterError::Encode(_)
        | SellerCenterError::InvalidBaseUrl { .. } => false,
    }
}

/// Upper bound for a single back-off sleep.
const MAX_DELAY_MS: u64 = 60_000;

/// Delay before retry number `attempt` (1-based): `backoff_base_ms * 2^(attempt-1)`,
/// capped at [`MAX_DELAY_MS`], then scaled by `jitter` (expected in `0.75..=1.25`).
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn backoff_delay(attempt: u32, backoff_base_ms: u64, jitter: f64) -> Duration {
    let exponent = attempt.saturating_sub(1).min(10);
    let capped = backoff_base_ms
        .saturating_mul(1u64 << exponent)
        .min(MAX_DELAY_MS);
    Duration::from_millis((capped as f64 * jitter) as u64)
}

/// Runs one product update `operation`, retrying it up to `max_retries` times.
///
/// Retried: 429 (seller quota exceeded), 5xx, timeouts and refused
/// connections. Returned on the first attempt: every other 4xx, including
/// signature rejections, plus local signing and encoding errors.
/// `operation` is re-invoked per attempt, so each retry is paced and signed
/// afresh.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, SellerCenterError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SellerCenterError>>,
{
    let mut retries = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if is_retriable(&err) && retries < max_retries => err,
            Err(err) => return Err(err),
        };
        retries += 1;
        let delay = backoff_delay(retries, backoff_base_ms, 0.75 + rand::random::<f64>() * 0.5);
        tracing::warn!(
            retry = retries,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "Seller Center request failed transiently; backing off"
        );
        tokio::time::sleep(delay).await;
    }
}
