//! # Inkwell Infrastructure
//!
//! Concrete implementations of the ports defined in `inkwell-core`.
//! This crate contains the database, auth, image storage and upstream AI
//! integrations.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No database, in-memory repositories only
//! - `postgres` - PostgreSQL database support via SeaORM
//! - `rate-limit` - Rate limiting via governor

pub mod ai;
pub mod auth;
pub mod database;
pub mod media;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

pub use ai::{ChatCompletionClient, CompletionConfig};
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use database::{InMemoryPostRepository, InMemoryUserRepository};
pub use media::{LocalImageStore, MediaConfig};

#[cfg(feature = "postgres")]
pub use database::{
    DatabaseConfig, DatabaseConnections, PostgresPostRepository, PostgresUserRepository,
};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};
