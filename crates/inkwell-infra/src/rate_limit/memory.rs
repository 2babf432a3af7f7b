//! In-memory keyed rate limiter using the governor crate.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota};

use inkwell_core::ports::{RateLimitError, RateLimitResult, RateLimiter};

/// In-memory rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window and key.
    pub max_requests: u32,
    /// Window duration.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 20,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_requests: std::env::var("AI_RATE_LIMIT_MAX_REQUESTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_requests),
            window: std::env::var("AI_RATE_LIMIT_WINDOW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.window),
        }
    }

    fn quota(&self) -> Quota {
        let burst = NonZeroU32::new(self.max_requests).unwrap_or(NonZeroU32::MIN);
        let period = (self.window / burst.get()).max(Duration::from_nanos(1));
        Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst)
    }
}

/// GCRA limiter with one bucket per key (client IP or user id).
///
/// Limits are per-process, not distributed across instances.
pub struct InMemoryRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
    clock: DefaultClock,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            limiter: DefaultKeyedRateLimiter::keyed(config.quota()),
            clock: DefaultClock::default(),
        }
    }

    /// Drop buckets that have fully replenished.
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError> {
        Ok(match self.limiter.check_key(&key.to_string()) {
            Ok(()) => RateLimitResult::allowed(),
            Err(not_until) => RateLimitResult::denied(not_until.wait_time_from(self.clock.now())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32) -> InMemoryRateLimiter {
        InMemoryRateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(60),
        })
    }

    #[tokio::test]
    async fn test_blocks_after_burst() {
        let limiter = limiter(3);

        for _ in 0..3 {
            assert!(limiter.check("10.0.0.1").await.unwrap().allowed);
        }

        let blocked = limiter.check("10.0.0.1").await.unwrap();
        assert!(!blocked.allowed);
        assert!(blocked.retry_after > Duration::ZERO);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = limiter(1);

        assert!(limiter.check("a").await.unwrap().allowed);
        assert!(!limiter.check("a").await.unwrap().allowed);
        assert!(limiter.check("b").await.unwrap().allowed);
    }
}
