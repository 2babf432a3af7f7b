//! Domain entities - the core business objects.

mod ai;
mod image;
mod post;
mod user;

pub use ai::{BlogOutline, ContentIdea, ImprovedContent, ImprovementKind, OutlineSection, SeoMetadata};
pub use image::{ImageDescriptor, ImagePurpose};
pub use post::{AiMeta, LikeToggle, Post, PostQuery, parse_tags};
pub use user::{AiSettings, DEFAULT_PROFILE_PICTURE, NewUser, Role, Tone, User};
