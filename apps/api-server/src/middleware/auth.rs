//! Authentication extractor.

use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use uuid::Uuid;

use inkwell_core::domain::Role;
use inkwell_core::ports::{AuthError, TokenClaims};

use super::error::AppError;
use crate::state::AppState;

/// Authenticated user identity extractor.
///
/// Use this in handlers to require authentication:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, user {}!", identity.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl Identity {
    /// Authors and admins may publish.
    pub fn require_publisher(&self, action: &str) -> Result<(), AppError> {
        if self.role.can_publish() {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "Only authors or admins can {action} posts"
            )))
        }
    }
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;

    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            tracing::error!("AppState not found in app data");
            return ready(Err(AppError::internal("AppState not registered")));
        };

        let result = bearer_token(req)
            .and_then(|token| state.tokens.validate_token(token))
            .map(Identity::from)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected bearer token");
                AppError::from(e)
            });

        ready(result)
    }
}
