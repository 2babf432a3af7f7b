//! AI assistant handlers. Every route here sits behind the AI rate limiter.

use std::str::FromStr;

use actix_web::{HttpResponse, web};
use chrono::Utc;
use uuid::Uuid;

use inkwell_core::domain::{ImprovedContent, ImprovementKind, Tone, User};
use inkwell_core::services::DEFAULT_SUMMARY_MAX_CHARS;
use inkwell_shared::ApiResponse;
use inkwell_shared::dto::{
    ImproveContentRequest, IntroductionsRequest, OutlineRequest, SeoRequest, SummaryRequest,
    SummaryResponse, UpdateAiSettingsRequest, UserResponse,
};

use super::{require_post, require_user, with_author};
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const DEFAULT_INTRODUCTION_COUNT: usize = 3;
const SUGGESTION_TAG_SOURCE_POSTS: u64 = 20;

fn require_assistant(user: &User) -> AppResult<()> {
    if !user.ai_settings.ai_assistant_enabled {
        return Err(AppError::forbidden("AI assistant is disabled in your settings"));
    }
    Ok(())
}

fn required(value: &str, message: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::bad_request(message));
    }
    Ok(value.to_string())
}

/// POST /api/ai/generate-outline
pub async fn generate_outline(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<OutlineRequest>,
) -> AppResult<HttpResponse> {
    let topic = required(&body.topic, "Topic is required")?;
    let user = require_user(&state, identity.user_id).await?;
    require_assistant(&user)?;

    let outline = state
        .assistant
        .generate_outline(&topic, user.ai_settings.preferred_tone)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(outline)))
}

/// POST /api/ai/generate-introductions
pub async fn generate_introductions(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<IntroductionsRequest>,
) -> AppResult<HttpResponse> {
    let topic = required(&body.topic, "Topic is required")?;
    let user = require_user(&state, identity.user_id).await?;
    require_assistant(&user)?;

    let introductions = state
        .assistant
        .generate_introductions(
            &topic,
            body.count.unwrap_or(DEFAULT_INTRODUCTION_COUNT),
            user.ai_settings.preferred_tone,
        )
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(introductions)))
}

/// POST /api/ai/improve-content
pub async fn improve_content(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<ImproveContentRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let content = required(&req.content, "Content is required")?;
    let user = require_user(&state, identity.user_id).await?;
    require_assistant(&user)?;

    let kind = req
        .improvement_type
        .as_deref()
        .map(ImprovementKind::parse_lenient)
        .unwrap_or_default();
    let improved = state
        .assistant
        .improve_content(&content, kind, user.ai_settings.preferred_tone)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(ImprovedContent {
        original_content: req.content,
        improved_content: improved,
        improvement_type: kind,
    })))
}

/// POST /api/ai/generate-seo
pub async fn generate_seo(
    state: web::Data<AppState>,
    _identity: Identity,
    body: web::Json<SeoRequest>,
) -> AppResult<HttpResponse> {
    if body.title.trim().is_empty() || body.content.trim().is_empty() {
        return Err(AppError::bad_request("Title and content are required"));
    }

    let seo = state
        .assistant
        .generate_seo(body.title.trim(), &body.content)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(seo)))
}

/// POST /api/ai/generate-summary
pub async fn generate_summary(
    state: web::Data<AppState>,
    _identity: Identity,
    body: web::Json<SummaryRequest>,
) -> AppResult<HttpResponse> {
    let content = required(body.content.as_deref().unwrap_or_default(), "Content is required")?;

    let summary = state
        .assistant
        .generate_summary(&content, DEFAULT_SUMMARY_MAX_CHARS)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(SummaryResponse { summary })))
}

/// POST /api/ai/posts/{id}/summary
///
/// Summarizes the supplied content, or the stored post body when none is
/// given, and records the result on the post.
pub async fn summarize_post(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<Uuid>,
    body: Option<web::Json<SummaryRequest>>,
) -> AppResult<HttpResponse> {
    let post = require_post(&state, path.into_inner()).await?;

    let supplied = body
        .and_then(|b| b.into_inner().content)
        .filter(|c| !c.trim().is_empty());
    let content = supplied.unwrap_or_else(|| post.content.clone());

    let summary = state
        .assistant
        .generate_summary(&content, DEFAULT_SUMMARY_MAX_CHARS)
        .await?;

    let meta = post
        .ai_meta
        .unwrap_or_default()
        .with_summary(summary.clone(), Utc::now());
    state
        .posts
        .set_ai_meta(post.id, meta)
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(SummaryResponse { summary })))
}

/// POST /api/ai/posts/{id}/generate-metadata
pub async fn generate_post_metadata(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = require_post(&state, path.into_inner()).await?;
    if !post.can_be_modified_by(identity.user_id, identity.role) {
        return Err(AppError::forbidden("Not authorized"));
    }

    let (seo, summary) = tokio::try_join!(
        state.assistant.generate_seo(&post.title, &post.content),
        state
            .assistant
            .generate_summary(&post.content, DEFAULT_SUMMARY_MAX_CHARS),
    )?;

    let now = Utc::now();
    let meta = post
        .ai_meta
        .unwrap_or_default()
        .with_seo(seo, now)
        .with_summary(summary, now);
    let updated = state
        .posts
        .set_ai_meta(post.id, meta)
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;

    tracing::info!(post_id = %updated.id, "AI metadata generated");

    Ok(HttpResponse::Ok().json(ApiResponse::ok(with_author(&state, updated).await?)))
}

/// GET /api/ai/suggest-content
pub async fn suggest_content(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let user = require_user(&state, identity.user_id).await?;
    if !user.ai_settings.content_suggestions {
        return Err(AppError::forbidden("Content suggestions are disabled in your settings"));
    }

    let posts = state
        .posts
        .find_by_author(user.id, Some(SUGGESTION_TAG_SOURCE_POSTS))
        .await?;
    let mut tags: Vec<String> = Vec::new();
    for tag in posts.into_iter().flat_map(|p| p.tags) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    let ideas = state.assistant.suggest_content_ideas(&[], &tags).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(ideas)))
}

/// GET /api/ai/settings
pub async fn get_settings(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let user = require_user(&state, identity.user_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(user.ai_settings)))
}

/// PUT /api/ai/settings
///
/// Applies only the fields that are present and valid; an unknown tone is
/// ignored rather than rejected.
pub async fn update_settings(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<UpdateAiSettingsRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let mut user = require_user(&state, identity.user_id).await?;

    if let Some(enabled) = req.ai_assistant_enabled {
        user.ai_settings.ai_assistant_enabled = enabled;
    }
    if let Some(enabled) = req.content_suggestions {
        user.ai_settings.content_suggestions = enabled;
    }
    if let Some(tone) = req.preferred_tone.as_deref() {
        match Tone::from_str(tone) {
            Ok(tone) => user.ai_settings.preferred_tone = tone,
            Err(e) => tracing::debug!(error = %e, "Ignoring invalid tone"),
        }
    }
    user.touch();

    let user = state.users.update(user).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(UserResponse::from(&user))))
}
