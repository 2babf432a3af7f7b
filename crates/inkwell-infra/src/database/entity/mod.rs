//! SeaORM entities.
//!
//! Image descriptors, AI metadata and AI settings live in `jsonb` columns;
//! the wrappers below give them a SeaORM value type while keeping the
//! domain structs free of ORM derives.

pub mod post;
pub mod user;

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

use inkwell_core::domain::{AiMeta, AiSettings, ImageDescriptor};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct StoredImage(pub ImageDescriptor);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct StoredAiMeta(pub AiMeta);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct StoredAiSettings(pub AiSettings);
