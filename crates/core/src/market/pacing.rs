use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Keeps consecutive outbound calls at least `min_interval` apart.
///
/// Backed by a single-cell GCRA limiter, so concurrent callers are released
/// one interval apart. A zero interval disables pacing.
pub struct RequestPacer {
    limiter: Option<DirectRateLimiter>,
}

impl RequestPacer {
    pub fn new(min_interval: Duration) -> Self {
        let limiter = Quota::with_period(min_interval)
            .map(|quota| RateLimiter::direct(quota.allow_burst(NonZeroU32::MIN)));
        Self { limiter }
    }

    pub async fn wait_turn(&self) {
        if let Some(limiter) = &self.limiter {
            if limiter.check().is_err() {
                tracing::debug!("pacing market data request");
                limiter.until_ready().await;
            }
        }
    }
}
