//! Data Transfer Objects - request/response types for the API.
//!
//! Bodies use camelCase keys. Multipart forms (registration, post create and
//! update, profile update) are parsed field by field on the server and have
//! no struct here.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use inkwell_core::domain::{AiMeta, AiSettings, ImageDescriptor, Post, Role, User};

// ---------------------------------------------------------------------------
// Auth & users
// ---------------------------------------------------------------------------

/// Request to login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response containing a user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub username: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub profile_picture: String,
    pub profile_image: Option<ImageDescriptor>,
    pub role: Role,
    pub ai_settings: AiSettings,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            firstname: user.firstname.clone(),
            lastname: user.lastname.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            date_of_birth: user.date_of_birth,
            profile_picture: user.profile_picture.clone(),
            profile_image: user.profile_image.clone(),
            role: user.role,
            ai_settings: user.ai_settings,
            created_at: user.created_at,
        }
    }
}

/// Response to a successful registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
}

/// Response containing an access token and the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    pub message: String,
    /// Only populated when the server is configured to expose reset tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

/// The slice of a user shown next to posts and likes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub username: String,
    pub role: Role,
    pub profile_picture: String,
}

impl From<&User> for AuthorSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            firstname: user.firstname.clone(),
            lastname: user.lastname.clone(),
            username: user.username.clone(),
            role: user.role,
            profile_picture: user.profile_picture.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    /// `None` when the author account no longer exists.
    pub author: Option<AuthorSummary>,
    pub cover_image: ImageDescriptor,
    pub likes: Vec<Uuid>,
    /// Populated on the single-post view only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked_by: Option<Vec<AuthorSummary>>,
    pub like_count: i64,
    pub view_count: i64,
    pub tags: Vec<String>,
    pub ai_meta: Option<AiMeta>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostResponse {
    pub fn new(post: Post, author: Option<AuthorSummary>) -> Self {
        let like_count = post.like_count();
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            author_id: post.author_id,
            author,
            cover_image: post.cover_image,
            likes: post.likes,
            liked_by: None,
            like_count,
            view_count: post.view_count,
            tags: post.tags,
            ai_meta: post.ai_meta,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }

    pub fn with_liked_by(mut self, liked_by: Vec<AuthorSummary>) -> Self {
        self.liked_by = Some(liked_by);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub q: Option<String>,
    /// Comma separated.
    pub tags: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub liked: bool,
    pub like_count: i64,
    pub message: String,
}

// ---------------------------------------------------------------------------
// AI assistant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineRequest {
    pub topic: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntroductionsRequest {
    pub topic: String,
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImproveContentRequest {
    pub content: String,
    pub improvement_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryRequest {
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// Partial update; absent or invalid fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateAiSettingsRequest {
    pub ai_assistant_enabled: Option<bool>,
    pub preferred_tone: Option<String>,
    pub content_suggestions: Option<bool>,
}
