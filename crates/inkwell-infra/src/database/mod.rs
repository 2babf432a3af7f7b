//! Repository implementations.
//!
//! PostgreSQL via SeaORM when the `postgres` feature is on, plus in-memory
//! repositories for development runs without a database and for tests.

mod memory;

#[cfg(feature = "postgres")]
mod connections;
#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
mod postgres_repo;

#[cfg(feature = "postgres")]
pub mod entity;

pub use memory::{InMemoryPostRepository, InMemoryUserRepository};

#[cfg(feature = "postgres")]
pub use connections::{DatabaseConfig, DatabaseConnections};
#[cfg(feature = "postgres")]
pub use postgres_repo::{PostgresPostRepository, PostgresUserRepository};
