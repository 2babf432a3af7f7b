//! Per-caller throttling for the AI routes.

mod memory;

pub use memory::{InMemoryRateLimiter, RateLimitConfig};
