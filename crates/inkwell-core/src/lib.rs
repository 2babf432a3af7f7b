//! # Inkwell Core
//!
//! The domain layer of the Inkwell blog backend.
//! This crate contains entities, ports and the AI prompt service, with zero
//! infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::DomainError;
