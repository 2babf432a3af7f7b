//! Request throttling port used in front of the AI routes.

use std::time::Duration;

use async_trait::async_trait;

/// Per-key request budget. Keys identify a caller, e.g. `user:<id>`.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count one request against `key`.
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    /// Zero when allowed.
    pub retry_after: Duration,
}

impl RateLimitResult {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            retry_after: Duration::ZERO,
        }
    }

    pub fn denied(retry_after: Duration) -> Self {
        Self {
            allowed: false,
            retry_after,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Rate limiter backend failed: {0}")]
    Backend(String),
}
