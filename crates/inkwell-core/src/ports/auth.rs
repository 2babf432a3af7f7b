//! Token and password ports.

use uuid::Uuid;

use crate::domain::Role;

/// What a verified bearer token says about its holder.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

/// Issues and verifies bearer tokens.
pub trait TokenService: Send + Sync {
    fn generate_token(&self, user_id: Uuid, email: &str, role: Role) -> Result<String, AuthError>;

    /// Signature, issuer and expiry are all checked.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Lifetime of issued tokens, in seconds.
    fn expiration_seconds(&self) -> i64;
}

/// One-way password hashing with salted, self-describing hashes.
pub trait PasswordService: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// `Ok(false)` for a wrong password; `Err` only when `hash` is unusable.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}
