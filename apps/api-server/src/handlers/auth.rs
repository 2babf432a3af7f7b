//! Authentication handlers.

use std::str::FromStr;

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use uuid::Uuid;

use inkwell_core::domain::{ImagePurpose, NewUser, Role, User};
use inkwell_core::error::RepoError;
use inkwell_core::ports::AuthError;
use inkwell_shared::MessageResponse;
use inkwell_shared::dto::{
    AuthResponse, ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest, RegisterResponse,
    ResetPasswordRequest, UserResponse,
};

use super::require_user;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::upload::{UploadForm, read_upload_form};

pub(super) const PROFILE_PICTURE_FIELD: &str = "profilePicture";
const MIN_PASSWORD_LEN: usize = 6;
const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub(super) fn parse_date_of_birth(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| AppError::bad_request("dateOfBirth must be a date (YYYY-MM-DD)"))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(super) fn check_password_length(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate the registration form. Nothing is written.
async fn validate_registration(
    state: &AppState,
    form: &UploadForm,
) -> AppResult<(NewUser, String)> {
    let required = |name: &str| {
        form.text(name)
            .map(str::to_string)
            .ok_or_else(|| AppError::bad_request(format!("{name} is required")))
    };

    let firstname = required("firstname")?;
    let lastname = required("lastname")?;
    let username = required("username")?;
    let email = normalize_email(&required("email")?);
    let date_of_birth = parse_date_of_birth(&required("dateOfBirth")?)?;
    let password = form
        .raw("password")
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::bad_request("password is required"))?
        .to_string();

    if !email.contains('@') {
        return Err(AppError::bad_request("Invalid email address"));
    }
    check_password_length(&password)?;

    let role = match form.text("role") {
        Some(raw) => Role::from_str(&raw.to_lowercase())?,
        None => Role::default(),
    };
    if role == Role::Admin {
        return Err(AppError::bad_request("The admin role cannot be self-assigned"));
    }

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::bad_request("User already registered"));
    }

    Ok((
        NewUser {
            firstname,
            lastname,
            username,
            email,
            date_of_birth,
            role,
        },
        password,
    ))
}

/// POST /api/auth/register - multipart with an optional profile picture.
pub async fn register(state: web::Data<AppState>, payload: Multipart) -> AppResult<HttpResponse> {
    let mut form = read_upload_form(payload, &state, &[PROFILE_PICTURE_FIELD]).await?;
    let picture = form.take_file(PROFILE_PICTURE_FIELD);

    let validated = validate_registration(&state, &form).await;
    form.discard(state.images.as_ref()).await;

    let (registration, password) = match validated {
        Ok(v) => v,
        Err(e) => {
            if let Some(picture) = picture {
                state.images.discard(picture).await;
            }
            return Err(e);
        }
    };

    let password_hash = match state.passwords.hash(&password) {
        Ok(hash) => hash,
        Err(e) => {
            if let Some(picture) = picture {
                state.images.discard(picture).await;
            }
            return Err(e.into());
        }
    };

    let mut user = User::new(registration, password_hash);
    if let Some(picture) = picture {
        let image = state
            .images
            .process(picture, ImagePurpose::ProfilePicture)
            .await?;
        user.replace_profile_image(image);
    }

    let image_path = user.profile_image.as_ref().map(|img| img.path.clone());
    let user = match state.users.create(user).await {
        Ok(user) => user,
        Err(e) => {
            if let Some(path) = image_path {
                let _ = state.images.delete(&path).await;
            }
            return Err(match e {
                RepoError::Constraint(_) => AppError::bad_request("User already registered"),
                other => other.into(),
            });
        }
    };

    tracing::info!(user_id = %user.id, role = %user.role, "User registered");

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "User created successfully".to_string(),
        user: UserResponse::from(&user),
    }))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_email(&normalize_email(&req.email))
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !state.passwords.verify(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected");
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state
        .tokens
        .generate_token(user.id, &user.email, user.role)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: u64::try_from(state.tokens.expiration_seconds()).unwrap_or_default(),
        user: UserResponse::from(&user),
    }))
}

/// GET /api/auth/me
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = require_user(&state, identity.user_id).await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(&user)))
}

/// POST /api/auth/forgot-password
///
/// Always answers the same way so the endpoint cannot be used to probe for
/// registered addresses.
pub async fn forgot_password(
    state: web::Data<AppState>,
    body: web::Json<ForgotPasswordRequest>,
) -> AppResult<HttpResponse> {
    let email = normalize_email(&body.email);
    if email.is_empty() {
        return Err(AppError::bad_request("email is required"));
    }

    let mut issued = None;
    if let Some(mut user) = state.users.find_by_email(&email).await? {
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        user.issue_reset_token(token.clone(), TimeDelta::hours(RESET_TOKEN_TTL_HOURS));
        state.users.update(user).await?;
        issued = Some(token);
    }

    Ok(HttpResponse::Ok().json(ForgotPasswordResponse {
        message: "If the email is registered, a password reset token has been issued".to_string(),
        reset_token: issued.filter(|_| state.expose_reset_tokens),
    }))
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    state: web::Data<AppState>,
    body: web::Json<ResetPasswordRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    check_password_length(&req.new_password)?;

    let invalid = || AppError::bad_request("Invalid or expired reset token");
    if req.token.trim().is_empty() {
        return Err(invalid());
    }

    let mut user = state
        .users
        .find_by_reset_token(req.token.trim())
        .await?
        .ok_or_else(invalid)?;
    if !user.reset_token_matches(req.token.trim(), Utc::now()) {
        return Err(invalid());
    }

    user.set_password_hash(state.passwords.hash(&req.new_password)?);
    state.users.update(user).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Password has been reset")))
}
