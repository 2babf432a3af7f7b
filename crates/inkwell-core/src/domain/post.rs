use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ai::SeoMetadata;
use super::image::ImageDescriptor;
use super::user::Role;

/// AI-generated metadata attached to a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiMeta {
    pub summary: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub suggested_tags: Vec<String>,
    pub generated_at: Option<DateTime<Utc>>,
}

impl AiMeta {
    pub fn with_summary(mut self, summary: String, now: DateTime<Utc>) -> Self {
        self.summary = Some(summary);
        self.generated_at = Some(now);
        self
    }

    pub fn with_seo(mut self, seo: SeoMetadata, now: DateTime<Utc>) -> Self {
        self.seo_title = Some(seo.seo_title);
        self.seo_description = Some(seo.seo_description);
        self.suggested_tags = seo.suggested_tags;
        self.generated_at = Some(now);
        self
    }
}

/// Post entity - represents a blog post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    /// HTML body.
    pub content: String,
    pub cover_image: ImageDescriptor,
    /// Users who liked the post, in the order they liked it.
    pub likes: Vec<Uuid>,
    pub view_count: i64,
    pub tags: Vec<String>,
    pub ai_meta: Option<AiMeta>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post. A cover image is mandatory.
    pub fn new(
        author_id: Uuid,
        title: String,
        content: String,
        cover_image: ImageDescriptor,
        tags: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            content,
            cover_image,
            likes: Vec::new(),
            view_count: 0,
            tags,
            ai_meta: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn like_count(&self) -> i64 {
        self.likes.len() as i64
    }

    /// Only admins and the post's own author may change or delete it.
    pub fn can_be_modified_by(&self, user_id: Uuid, role: Role) -> bool {
        role == Role::Admin || (role.can_publish() && self.author_id == user_id)
    }

    /// Swap the cover image, returning the superseded descriptor.
    pub fn replace_cover(&mut self, cover: ImageDescriptor) -> ImageDescriptor {
        std::mem::replace(&mut self.cover_image, cover)
    }

    /// Add or remove `user_id` from the like set and report the new state.
    pub fn toggle_like(&mut self, user_id: Uuid) -> LikeToggle {
        let liked = match self.likes.iter().position(|id| *id == user_id) {
            Some(idx) => {
                self.likes.remove(idx);
                false
            }
            None => {
                self.likes.push(user_id);
                true
            }
        };

        LikeToggle {
            liked,
            like_count: self.like_count(),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Outcome of a like toggle, counted from current membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggle {
    pub liked: bool,
    pub like_count: i64,
}

/// Filter for post search. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
    /// Case-insensitive substring matched against title and content.
    pub text: Option<String>,
    /// Matches posts carrying at least one of these tags.
    pub tags: Vec<String>,
}

impl PostQuery {
    pub fn matches(&self, post: &Post) -> bool {
        let text_ok = match &self.text {
            Some(text) => {
                let needle = text.to_lowercase();
                post.title.to_lowercase().contains(&needle)
                    || post.content.to_lowercase().contains(&needle)
            }
            None => true,
        };
        let tags_ok = self.tags.is_empty() || self.tags.iter().any(|t| post.tags.contains(t));

        text_ok && tags_ok
    }
}

/// Split a comma separated tag list, trimming and dropping empties and duplicates.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}
