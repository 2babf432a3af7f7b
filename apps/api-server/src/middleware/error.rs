//! Error handling - every failure becomes a flat `{ "error": "..." }` body.

use std::fmt;

use actix_web::{HttpRequest, HttpResponse, ResponseError, error, http::StatusCode};

use inkwell_core::error::{DomainError, RepoError};
use inkwell_core::ports::{AiError, AuthError, MediaError};
use inkwell_shared::ErrorResponse;

/// Application-level error type returned by every handler.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    /// Detail is logged, never sent to the client.
    Internal(String),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(detail: impl fmt::Display) -> Self {
        Self::Internal(detail.to_string())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg) => ErrorResponse::new(msg.clone()),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => {
                tracing::debug!(constraint = %msg, "Constraint violation");
                AppError::BadRequest("Resource already exists".to_string())
            }
            RepoError::Connection(msg) => {
                AppError::Internal(format!("Database connection error: {}", msg))
            }
            RepoError::Query(msg) => AppError::Internal(format!("Database query error: {}", msg)),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingAuth => AppError::Unauthorized("Authentication required".to_string()),
            AuthError::TokenExpired => AppError::Unauthorized("Token expired".to_string()),
            AuthError::InvalidToken(_) => AppError::Unauthorized("Invalid token".to_string()),
            AuthError::InvalidCredentials => {
                AppError::BadRequest("Invalid email or password".to_string())
            }
            AuthError::Hashing(msg) => AppError::Internal(msg),
        }
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::UnsupportedType(_) => {
                AppError::BadRequest("Only image files are allowed".to_string())
            }
            MediaError::TooLarge { .. } | MediaError::TooManyFiles { .. } => {
                AppError::BadRequest(err.to_string())
            }
            MediaError::InvalidPath(path) => {
                AppError::Internal(format!("Refusing to touch stored path {}", path))
            }
            MediaError::Processing(_) | MediaError::Io(_) => {
                AppError::Internal(format!("Image processing failed: {}", err))
            }
        }
    }
}

impl From<AiError> for AppError {
    fn from(err: AiError) -> Self {
        AppError::Internal(format!("AI request failed: {}", err))
    }
}

/// Malformed JSON bodies are reported in the same shape as handler errors.
pub fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid JSON body: {}", err)).into()
}

/// Unparseable path ids cannot match any resource.
pub fn path_error_handler(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(error = %err, "Unparseable path parameter");
    AppError::NotFound("Resource not found".to_string()).into()
}

pub fn query_error_handler(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid query string: {}", err)).into()
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;

    use super::*;

    #[actix_web::test]
    async fn test_internal_detail_is_not_leaked() {
        let response = AppError::internal("password column missing").error_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Internal server error" }));
    }

    #[test]
    fn test_media_errors_split_into_client_and_server_faults() {
        let client: AppError = MediaError::TooLarge { limit: 10 }.into();
        assert_eq!(client.status_code(), StatusCode::BAD_REQUEST);

        let server: AppError = MediaError::Processing("bad huffman".into()).into();
        assert_eq!(server.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_auth_errors_map_to_401() {
        let err: AppError = AuthError::TokenExpired.into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err: AppError = AuthError::MissingAuth.into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }
}
