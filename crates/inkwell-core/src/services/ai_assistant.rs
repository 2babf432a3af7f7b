//! AI writing assistant: prompt construction and typed response handling.

use std::sync::Arc;

use crate::domain::{BlogOutline, ContentIdea, ImprovementKind, SeoMetadata, Tone};
use crate::ports::{AiError, CompletionClient, CompletionRequest};

use super::ai_output::{normalize_tags, parse_typed, truncate_chars};

pub const SEO_TITLE_MAX_CHARS: usize = 60;
pub const SEO_DESCRIPTION_MAX_CHARS: usize = 160;
pub const DEFAULT_SUMMARY_MAX_CHARS: usize = 150;
pub const MAX_INTRODUCTIONS: usize = 10;

/// Only the head of a post is sent for SEO analysis.
const SEO_CONTENT_PREVIEW_CHARS: usize = 1000;
const MAX_IDEA_TAGS: usize = 10;

/// Builds prompts from caller input and forwards them to the completion API.
///
/// Every operation is exactly one upstream call. Nothing is cached or retried.
#[derive(Clone)]
pub struct AiAssistant {
    client: Arc<dyn CompletionClient>,
}

impl AiAssistant {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    async fn ask(&self, operation: &'static str, prompt: String, temperature: f32) -> Result<String, AiError> {
        tracing::debug!(operation, prompt_chars = prompt.len(), "Sending completion request");
        let text = self
            .client
            .complete(CompletionRequest::new(prompt, temperature))
            .await?;
        if text.trim().is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(text)
    }

    pub async fn generate_outline(&self, topic: &str, tone: Tone) -> Result<BlogOutline, AiError> {
        let prompt = format!(
            "Create a detailed blog outline for the topic: \"{topic}\".\n\
             Use a {tone} tone. Provide a compelling title and 3-5 main sections, \
             each with a brief description and key points.\n\
             Respond with JSON only, shaped as:\n\
             {{\"title\": \"...\", \"sections\": [{{\"heading\": \"...\", \"description\": \"...\", \"keyPoints\": [\"...\"]}}]}}"
        );
        let raw = self.ask("outline", prompt, 0.7).await?;

        let mut outline: BlogOutline = parse_typed("outline", &raw)?;
        outline.title = outline.title.trim().to_string();
        outline.sections.retain(|s| !s.heading.trim().is_empty());
        if outline.title.is_empty() {
            return Err(AiError::MalformedResponse {
                operation: "outline",
                detail: "empty title".to_string(),
            });
        }
        Ok(outline)
    }

    /// Falls back to the paragraphs of the raw reply when it is not a JSON array.
    pub async fn generate_introductions(
        &self,
        topic: &str,
        count: usize,
        tone: Tone,
    ) -> Result<Vec<String>, AiError> {
        let count = count.clamp(1, MAX_INTRODUCTIONS);
        let prompt = format!(
            "Generate {count} different introductory paragraphs for a blog post about: \"{topic}\".\n\
             Use a {tone} tone. Each introduction should be engaging, unique, and 2-3 sentences long.\n\
             Respond with a JSON array of strings only."
        );
        let raw = self.ask("introductions", prompt, 0.8).await?;

        let intros = match parse_typed::<Vec<String>>("introductions", &raw) {
            Ok(list) => list,
            Err(e) => {
                tracing::debug!(error = %e, "Introductions were not JSON, splitting paragraphs");
                raw.split("\n\n").map(str::to_string).collect()
            }
        };

        let intros: Vec<String> = intros
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .take(count)
            .collect();

        if intros.is_empty() {
            return Err(AiError::MalformedResponse {
                operation: "introductions",
                detail: "no usable paragraphs".to_string(),
            });
        }
        Ok(intros)
    }

    pub async fn improve_content(
        &self,
        content: &str,
        kind: ImprovementKind,
        tone: Tone,
    ) -> Result<String, AiError> {
        let prompt = match kind {
            ImprovementKind::Grammar => format!(
                "Fix grammar, spelling, and punctuation errors in this text while keeping its meaning and a {tone} tone:\n\n{content}"
            ),
            ImprovementKind::Readability => format!(
                "Improve the readability and flow of this text while keeping a {tone} tone. Make it more engaging and easier to understand:\n\n{content}"
            ),
            ImprovementKind::Expand => format!(
                "Expand this text with more details, examples, and explanations while keeping a {tone} tone:\n\n{content}"
            ),
            ImprovementKind::Summarize => format!(
                "Summarize this text into a concise version that keeps the key points and a {tone} tone:\n\n{content}"
            ),
            ImprovementKind::General => format!(
                "Improve this text for clarity and engagement with a {tone} tone:\n\n{content}"
            ),
        };

        let raw = self.ask("improve", prompt, 0.5).await?;
        Ok(raw.trim().to_string())
    }

    pub async fn generate_seo(&self, title: &str, content: &str) -> Result<SeoMetadata, AiError> {
        let preview = truncate_chars(content, SEO_CONTENT_PREVIEW_CHARS);
        let prompt = format!(
            "Analyze this blog post and generate SEO metadata.\n\n\
             Title: {title}\n\
             Content: {preview}\n\n\
             Respond with JSON only, shaped as:\n\
             {{\"seoTitle\": \"max {SEO_TITLE_MAX_CHARS} chars\", \"seoDescription\": \"max {SEO_DESCRIPTION_MAX_CHARS} chars\", \"suggestedTags\": [\"tag1\", \"tag2\", \"tag3\", \"tag4\", \"tag5\"]}}"
        );
        let raw = self.ask("seo", prompt, 0.3).await?;

        let seo: SeoMetadata = parse_typed("seo", &raw)?;
        Ok(SeoMetadata {
            seo_title: truncate_chars(&seo.seo_title, SEO_TITLE_MAX_CHARS),
            seo_description: truncate_chars(&seo.seo_description, SEO_DESCRIPTION_MAX_CHARS),
            suggested_tags: normalize_tags(seo.suggested_tags),
        })
    }

    pub async fn generate_summary(&self, content: &str, max_chars: usize) -> Result<String, AiError> {
        let prompt = format!(
            "Create a concise summary (TL;DR) of this blog post in at most {max_chars} characters. \
             Make it engaging and highlight the key takeaways:\n\n{content}\n\n\
             Return only the summary text, no additional formatting."
        );
        let raw = self.ask("summary", prompt, 0.4).await?;
        Ok(raw.trim().trim_matches('"').trim().to_string())
    }

    pub async fn suggest_content_ideas(
        &self,
        interests: &[String],
        existing_tags: &[String],
    ) -> Result<Vec<ContentIdea>, AiError> {
        let interests = if interests.is_empty() {
            "general topics".to_string()
        } else {
            interests.join(", ")
        };
        let tags = if existing_tags.is_empty() {
            "none".to_string()
        } else {
            existing_tags
                .iter()
                .take(MAX_IDEA_TAGS)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        };
        let prompt = format!(
            "Suggest 5 blog post ideas based on:\n\
             User interests: {interests}\n\
             Existing blog tags: {tags}\n\n\
             Respond with JSON only, shaped as:\n\
             [{{\"title\": \"...\", \"description\": \"...\", \"suggestedTags\": [\"tag1\", \"tag2\", \"tag3\"]}}]"
        );
        let raw = self.ask("ideas", prompt, 0.8).await?;

        let ideas: Vec<ContentIdea> = parse_typed("ideas", &raw)?;
        Ok(ideas
            .into_iter()
            .filter(|idea| !idea.title.trim().is_empty())
            .map(|idea| ContentIdea {
                title: idea.title.trim().to_string(),
                description: idea.description.trim().to_string(),
                suggested_tags: normalize_tags(idea.suggested_tags),
            })
            .collect())
    }
}
