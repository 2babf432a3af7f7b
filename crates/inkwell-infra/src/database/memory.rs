//! In-memory repositories - used when no database is configured and in tests.
//!
//! Data is lost on process restart. Each mutation holds the write lock for its
//! whole read-modify-write, which gives the same atomicity the SQL versions
//! get from single statements.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use inkwell_core::domain::{AiMeta, LikeToggle, Post, PostQuery, User};
use inkwell_core::error::RepoError;
use inkwell_core::ports::{BaseRepository, PostRepository, UserRepository};

/// In-memory user store keyed by id.
#[derive(Default)]
pub struct InMemoryUserRepository {
    store: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn create(&self, user: User) -> Result<User, RepoError> {
        let mut store = self.store.write().await;
        if store.values().any(|u| u.email == user.email) {
            return Err(RepoError::Constraint("users_email_key".to_string()));
        }
        if store.contains_key(&user.id) {
            return Err(RepoError::Constraint("users_pkey".to_string()));
        }
        store.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut store = self.store.write().await;
        if store.values().any(|u| u.email == user.email && u.id != user.id) {
            return Err(RepoError::Constraint("users_email_key".to_string()));
        }
        let slot = store.get_mut(&user.id).ok_or(RepoError::NotFound)?;
        *slot = user.clone();
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.store
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        let store = self.store.read().await;
        Ok(ids.iter().filter_map(|id| store.get(id).cloned()).collect())
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store
            .values()
            .find(|u| u.reset_password_token.as_deref() == Some(token))
            .cloned())
    }
}

/// In-memory post store keyed by id.
#[derive(Default)]
pub struct InMemoryPostRepository {
    store: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn collect_sorted(&self, filter: impl Fn(&Post) -> bool) -> Vec<Post> {
        let store = self.store.read().await;
        let mut posts: Vec<Post> = store.values().filter(|p| filter(p)).cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn create(&self, mut post: Post) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;
        if store.contains_key(&post.id) {
            return Err(RepoError::Constraint("posts_pkey".to_string()));
        }
        post.likes.clear();
        post.view_count = 0;
        store.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, mut post: Post) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;
        let slot = store.get_mut(&post.id).ok_or(RepoError::NotFound)?;
        // Counters are owned by toggle_like and increment_views.
        post.likes = std::mem::take(&mut slot.likes);
        post.view_count = slot.view_count;
        *slot = post.clone();
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.store
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list_recent(&self) -> Result<Vec<Post>, RepoError> {
        Ok(self.collect_sorted(|_| true).await)
    }

    async fn search(&self, query: &PostQuery) -> Result<Vec<Post>, RepoError> {
        Ok(self.collect_sorted(|p| query.matches(p)).await)
    }

    async fn find_by_author(
        &self,
        author_id: Uuid,
        limit: Option<u64>,
    ) -> Result<Vec<Post>, RepoError> {
        let mut posts = self.collect_sorted(|p| p.author_id == author_id).await;
        if let Some(limit) = limit {
            posts.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(posts)
    }

    async fn increment_views(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let mut store = self.store.write().await;
        Ok(store.get_mut(&id).map(|post| {
            post.view_count += 1;
            post.clone()
        }))
    }

    async fn toggle_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<LikeToggle>, RepoError> {
        let mut store = self.store.write().await;
        Ok(store.get_mut(&id).map(|post| post.toggle_like(user_id)))
    }

    async fn set_ai_meta(&self, id: Uuid, meta: AiMeta) -> Result<Option<Post>, RepoError> {
        let mut store = self.store.write().await;
        Ok(store.get_mut(&id).map(|post| {
            post.ai_meta = Some(meta);
            post.updated_at = Utc::now();
            post.clone()
        }))
    }
}
