//! Typed shapes of AI assistant output.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogOutline {
    pub title: String,
    #[serde(default)]
    pub sections: Vec<OutlineSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineSection {
    pub heading: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub key_points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoMetadata {
    pub seo_title: String,
    pub seo_description: String,
    #[serde(default)]
    pub suggested_tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentIdea {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub suggested_tags: Vec<String>,
}

/// What kind of rewrite `improve_content` should ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImprovementKind {
    Grammar,
    #[default]
    Readability,
    Expand,
    Summarize,
    General,
}

impl ImprovementKind {
    /// Unknown kinds fall back to a general clarity pass.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "grammar" => ImprovementKind::Grammar,
            "readability" => ImprovementKind::Readability,
            "expand" => ImprovementKind::Expand,
            "summarize" => ImprovementKind::Summarize,
            _ => ImprovementKind::General,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovedContent {
    pub original_content: String,
    pub improved_content: String,
    pub improvement_type: ImprovementKind,
}
