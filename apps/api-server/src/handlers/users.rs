//! Profile handlers for the authenticated user.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};

use inkwell_core::domain::{ImagePurpose, User};
use inkwell_shared::MessageResponse;
use inkwell_shared::dto::{ChangePasswordRequest, PostListResponse, UserResponse};

use super::auth::{PROFILE_PICTURE_FIELD, check_password_length, parse_date_of_birth};
use super::{require_user, with_authors};
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::upload::{UploadForm, read_upload_form};

/// GET /api/user/profile
pub async fn get_profile(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let user = require_user(&state, identity.user_id).await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(&user)))
}

/// PUT /api/user/profile - multipart; absent fields are left unchanged.
pub async fn update_profile(
    state: web::Data<AppState>,
    identity: Identity,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let mut user = require_user(&state, identity.user_id).await?;

    let mut form = read_upload_form(payload, &state, &[PROFILE_PICTURE_FIELD]).await?;
    let picture = form.take_file(PROFILE_PICTURE_FIELD);

    let edits = apply_profile_edits(&mut user, &form);
    form.discard(state.images.as_ref()).await;

    if let Err(e) = edits {
        if let Some(picture) = picture {
            state.images.discard(picture).await;
        }
        return Err(e);
    }

    let mut replaced = None;
    if let Some(picture) = picture {
        let image = state
            .images
            .process(picture, ImagePurpose::ProfilePicture)
            .await?;
        replaced = Some(user.replace_profile_image(image));
    }
    user.touch();

    let new_image_path = user.profile_image.as_ref().map(|img| img.path.clone());
    let user = match state.users.update(user).await {
        Ok(user) => user,
        Err(e) => {
            if let (Some(_), Some(path)) = (&replaced, &new_image_path) {
                let _ = state.images.delete(path).await;
            }
            return Err(e.into());
        }
    };

    if let Some(Some(old)) = replaced {
        if let Err(e) = state.images.delete(&old.path).await {
            tracing::warn!(path = %old.path, error = %e, "Failed to delete replaced profile picture");
        }
    }

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(HttpResponse::Ok().json(UserResponse::from(&user)))
}

fn apply_profile_edits(user: &mut User, form: &UploadForm) -> AppResult<()> {
    if let Some(firstname) = form.text("firstname") {
        user.firstname = firstname.to_string();
    }
    if let Some(lastname) = form.text("lastname") {
        user.lastname = lastname.to_string();
    }
    if let Some(username) = form.text("username") {
        user.username = username.to_string();
    }
    if let Some(email) = form.text("email") {
        if !email.contains('@') {
            return Err(AppError::bad_request("Invalid email address"));
        }
        user.email = email.to_lowercase();
    }
    if let Some(raw) = form.text("dateOfBirth") {
        user.date_of_birth = parse_date_of_birth(raw)?;
    }
    Ok(())
}

/// PUT /api/user/password
pub async fn change_password(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<ChangePasswordRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    if req.current_password.is_empty() || req.new_password.is_empty() {
        return Err(AppError::bad_request(
            "Current and new password are required",
        ));
    }
    check_password_length(&req.new_password)?;
    if req.new_password != req.confirm_password {
        return Err(AppError::bad_request("Passwords do not match"));
    }

    let mut user = require_user(&state, identity.user_id).await?;

    if !state
        .passwords
        .verify(&req.current_password, &user.password_hash)?
    {
        return Err(AppError::bad_request("Current password is incorrect"));
    }

    user.set_password_hash(state.passwords.hash(&req.new_password)?);
    state.users.update(user).await?;

    tracing::info!(user_id = %identity.user_id, "Password changed");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Password updated successfully")))
}

/// GET /api/user/posts
pub async fn my_posts(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let posts = state.posts.find_by_author(identity.user_id, None).await?;

    Ok(HttpResponse::Ok().json(PostListResponse {
        posts: with_authors(&state, posts).await?,
    }))
}
