//! Domain services built on top of the ports.

mod ai_assistant;
mod ai_output;

pub use ai_assistant::{AiAssistant, DEFAULT_SUMMARY_MAX_CHARS};
