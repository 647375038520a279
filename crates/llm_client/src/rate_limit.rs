//! Request rate limiter shared by every OpenRouter caller.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::debug;

/// Per-minute request budget. Clones share one bucket.
#[derive(Debug, Clone)]
pub struct RequestLimiter {
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl RequestLimiter {
    /// A zero budget is treated as one request per minute.
    pub fn per_minute(requests: u32) -> Self {
        let rpm = NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(rpm))),
        }
    }

    /// Wait until a request slot is available.
    pub async fn wait(&self) {
        if self.try_acquire() {
            return;
        }
        debug!("request budget exhausted, waiting for a slot");
        self.limiter.until_ready().await;
    }

    /// Take a slot without waiting. Returns true if acquired.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_then_blocked() {
        let limiter = RequestLimiter::per_minute(3);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn test_clones_share_budget() {
        let a = RequestLimiter::per_minute(1);
        let b = a.clone();
        assert!(a.try_acquire());
        assert!(!b.try_acquire());
    }

    #[tokio::test]
    async fn test_wait_takes_free_slot() {
        let limiter = RequestLimiter::per_minute(2);
        limiter.wait().await;
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn test_zero_budget_still_allows_one() {
        let limiter = RequestLimiter::per_minute(0);
        assert!(limiter.try_acquire());
    }
}
