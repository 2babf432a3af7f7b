//! Upstream language-model integration.

mod chat;

pub use chat::{ChatCompletionClient, CompletionConfig};
