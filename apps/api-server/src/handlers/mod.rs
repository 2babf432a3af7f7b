//! HTTP handlers and route configuration.

mod ai;
mod auth;
mod health;
mod posts;
mod users;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;

use actix_web::web;
use uuid::Uuid;

use inkwell_core::domain::{Post, User};
use inkwell_core::ports::RateLimiter;
use inkwell_shared::dto::{AuthorSummary, PostResponse};

use crate::middleware::error::{AppError, AppResult};
use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::state::AppState;

/// Configure all application routes. `ai_limiter` guards the `/api/ai` scope.
pub fn configure_routes(cfg: &mut web::ServiceConfig, ai_limiter: Option<Arc<dyn RateLimiter>>) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me))
                    .route("/forgot-password", web::post().to(auth::forgot_password))
                    .route("/reset-password", web::post().to(auth::reset_password)),
            )
            .service(
                web::scope("/posts")
                    .route("/create", web::post().to(posts::create_post))
                    .route("/all", web::get().to(posts::list_posts))
                    .route("/search", web::get().to(posts::search_posts))
                    .route("/{id}", web::get().to(posts::get_post))
                    .route("/{id}", web::put().to(posts::update_post))
                    .route("/{id}", web::delete().to(posts::delete_post))
                    .route("/{id}/like", web::post().to(posts::toggle_like)),
            )
            .service(
                web::scope("/user")
                    .route("/profile", web::get().to(users::get_profile))
                    .route("/profile", web::put().to(users::update_profile))
                    .route("/password", web::put().to(users::change_password))
                    .route("/posts", web::get().to(users::my_posts)),
            )
            .service(
                web::scope("/ai")
                    .wrap(RateLimitMiddleware::new(ai_limiter))
                    .route("/generate-outline", web::post().to(ai::generate_outline))
                    .route(
                        "/generate-introductions",
                        web::post().to(ai::generate_introductions),
                    )
                    .route("/improve-content", web::post().to(ai::improve_content))
                    .route("/generate-seo", web::post().to(ai::generate_seo))
                    .route("/generate-summary", web::post().to(ai::generate_summary))
                    .route("/posts/{id}/summary", web::post().to(ai::summarize_post))
                    .route(
                        "/posts/{id}/generate-metadata",
                        web::post().to(ai::generate_post_metadata),
                    )
                    .route("/suggest-content", web::get().to(ai::suggest_content))
                    .route("/settings", web::get().to(ai::get_settings))
                    .route("/settings", web::put().to(ai::update_settings)),
            ),
    );
}

/// Load a user that must exist, e.g. the owner of a valid token.
async fn require_user(state: &AppState, user_id: Uuid) -> AppResult<User> {
    state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

async fn require_post(state: &AppState, post_id: Uuid) -> AppResult<Post> {
    state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))
}

/// Attach author summaries with a single batched user lookup.
async fn with_authors(state: &AppState, posts: Vec<Post>) -> AppResult<Vec<PostResponse>> {
    let mut author_ids: Vec<Uuid> = posts.iter().map(|p| p.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors: HashMap<Uuid, AuthorSummary> = state
        .users
        .find_by_ids(&author_ids)
        .await?
        .iter()
        .map(|u| (u.id, AuthorSummary::from(u)))
        .collect();

    Ok(posts
        .into_iter()
        .map(|post| {
            let author = authors.get(&post.author_id).cloned();
            PostResponse::new(post, author)
        })
        .collect())
}

async fn with_author(state: &AppState, post: Post) -> AppResult<PostResponse> {
    let author = state.users.find_by_id(post.author_id).await?;
    Ok(PostResponse::new(post, author.as_ref().map(AuthorSummary::from)))
}
