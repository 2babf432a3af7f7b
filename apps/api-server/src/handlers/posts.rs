//! Post handlers.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use uuid::Uuid;

use inkwell_core::domain::{ImagePurpose, Post, PostQuery, parse_tags};
use inkwell_shared::MessageResponse;
use inkwell_shared::dto::{AuthorSummary, LikeResponse, PostListResponse, SearchParams};

use super::{require_post, with_author, with_authors};
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::upload::read_upload_form;

const COVER_FIELD: &str = "coverImage";

/// POST /api/posts/create
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    identity.require_publisher("create")?;

    let mut form = read_upload_form(payload, &state, &[COVER_FIELD]).await?;
    let cover = form.take_file(COVER_FIELD);

    let title = form.text("title").map(str::to_string);
    let content = form.text("content").map(str::to_string);
    let tags = form
        .joined("tags")
        .map(|raw| parse_tags(&raw))
        .unwrap_or_default();
    form.discard(state.images.as_ref()).await;

    let (Some(title), Some(content)) = (title, content) else {
        if let Some(cover) = cover {
            state.images.discard(cover).await;
        }
        return Err(AppError::bad_request("Title and content are required"));
    };

    let Some(cover) = cover else {
        return Err(AppError::bad_request("Cover image is required"));
    };
    let cover_image = state.images.process(cover, ImagePurpose::PostImage).await?;
    let cover_path = cover_image.path.clone();

    let post = Post::new(identity.user_id, title, content, cover_image, tags);
    let post = match state.posts.create(post).await {
        Ok(post) => post,
        Err(e) => {
            let _ = state.images.delete(&cover_path).await;
            return Err(e.into());
        }
    };

    tracing::info!(post_id = %post.id, author_id = %identity.user_id, "Post created");

    Ok(HttpResponse::Created().json(with_author(&state, post).await?))
}

/// GET /api/posts/all
pub async fn list_posts(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.posts.list_recent().await?;

    Ok(HttpResponse::Ok().json(PostListResponse {
        posts: with_authors(&state, posts).await?,
    }))
}

/// GET /api/posts/search?q=&tags=a,b
pub async fn search_posts(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> AppResult<HttpResponse> {
    let params = params.into_inner();
    let query = PostQuery {
        text: params
            .q
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty()),
        tags: params.tags.as_deref().map(parse_tags).unwrap_or_default(),
    };

    let posts = state.posts.search(&query).await?;

    Ok(HttpResponse::Ok().json(PostListResponse {
        posts: with_authors(&state, posts).await?,
    }))
}

/// GET /api/posts/{id} - counts as a view.
pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .increment_views(path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;

    let likers = state.users.find_by_ids(&post.likes).await?;
    let liked_by = likers.iter().map(AuthorSummary::from).collect();

    let response = with_author(&state, post).await?.with_liked_by(liked_by);

    Ok(HttpResponse::Ok().json(response))
}

/// PUT /api/posts/{id} - multipart; every field is optional.
pub async fn update_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    identity.require_publisher("update")?;

    let mut post = require_post(&state, path.into_inner()).await?;
    if !post.can_be_modified_by(identity.user_id, identity.role) {
        return Err(AppError::forbidden(
            "You are not authorized to update this post",
        ));
    }

    let mut form = read_upload_form(payload, &state, &[COVER_FIELD]).await?;
    let cover = form.take_file(COVER_FIELD);

    if let Some(title) = form.text("title") {
        post.title = title.to_string();
    }
    if let Some(content) = form.text("content") {
        post.content = content.to_string();
    }
    if let Some(tags) = form.joined("tags") {
        post.tags = parse_tags(&tags);
    }
    form.discard(state.images.as_ref()).await;

    let mut replaced = None;
    if let Some(cover) = cover {
        let image = state.images.process(cover, ImagePurpose::PostImage).await?;
        replaced = Some(post.replace_cover(image));
    }
    post.touch();

    let new_cover_path = post.cover_image.path.clone();
    let post = match state.posts.update(post).await {
        Ok(post) => post,
        Err(e) => {
            if replaced.is_some() {
                let _ = state.images.delete(&new_cover_path).await;
            }
            return Err(e.into());
        }
    };

    if let Some(old) = replaced {
        if let Err(e) = state.images.delete(&old.path).await {
            tracing::warn!(path = %old.path, error = %e, "Failed to delete replaced cover image");
        }
    }

    tracing::info!(post_id = %post.id, "Post updated");

    Ok(HttpResponse::Ok().json(with_author(&state, post).await?))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    identity.require_publisher("delete")?;

    let post = require_post(&state, path.into_inner()).await?;
    if !post.can_be_modified_by(identity.user_id, identity.role) {
        return Err(AppError::forbidden(
            "You are not authorized to delete this post",
        ));
    }

    if let Err(e) = state.images.delete(&post.cover_image.path).await {
        tracing::warn!(path = %post.cover_image.path, error = %e, "Failed to delete cover image");
    }

    match state.posts.delete(post.id).await {
        Ok(()) => {}
        Err(inkwell_core::error::RepoError::NotFound) => {
            return Err(AppError::not_found("Post not found"));
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(post_id = %post.id, "Post deleted");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Post deleted successfully")))
}

/// POST /api/posts/{id}/like
pub async fn toggle_like(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let toggle = state
        .posts
        .toggle_like(path.into_inner(), identity.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;

    let message = if toggle.liked {
        "Post liked successfully"
    } else {
        "Post unliked successfully"
    };

    Ok(HttpResponse::Ok().json(LikeResponse {
        liked: toggle.liked,
        like_count: toggle.like_count,
        message: message.to_string(),
    }))
}
