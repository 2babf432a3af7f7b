use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{AiMeta, LikeToggle, Post, PostQuery, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity.
    async fn create(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity. Fails with `RepoError::NotFound` if it is gone.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID. Fails with `RepoError::NotFound` if it is gone.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Load several users at once; missing ids are skipped.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError>;

    /// Find the user holding a password-reset token.
    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, RepoError>;
}

/// Post repository.
///
/// `update` writes the editable fields only. Likes and the view counter are
/// changed exclusively through `toggle_like` and `increment_views`, which
/// must be atomic with respect to concurrent callers.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// All posts, newest first.
    async fn list_recent(&self) -> Result<Vec<Post>, RepoError>;

    /// Posts matching the query, newest first.
    async fn search(&self, query: &PostQuery) -> Result<Vec<Post>, RepoError>;

    /// Posts written by `author_id`, newest first, optionally capped.
    async fn find_by_author(
        &self,
        author_id: Uuid,
        limit: Option<u64>,
    ) -> Result<Vec<Post>, RepoError>;

    /// Bump the view counter and return the updated post, or `None` if absent.
    async fn increment_views(&self, id: Uuid) -> Result<Option<Post>, RepoError>;

    /// Add `user_id` to the likes if absent, remove it otherwise.
    /// Returns `None` if the post does not exist.
    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<LikeToggle>, RepoError>;

    /// Replace the AI metadata block. Returns `None` if the post does not exist.
    async fn set_ai_meta(&self, id: Uuid, meta: AiMeta) -> Result<Option<Post>, RepoError>;
}
