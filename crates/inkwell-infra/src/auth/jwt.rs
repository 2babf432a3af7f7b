//! JWT token service implementation.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use inkwell_core::domain::Role;
use inkwell_core::ports::{AuthError, TokenClaims, TokenService};

const DEFAULT_SECRET: &str = "change-me-in-production";

/// JWT token service configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            expiration_hours: 10,
            issuer: "inkwell-api".to_string(),
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let secret = std::env::var("JWT_SECRET").unwrap_or(defaults.secret);

        // Warn if using default secret in production
        if secret == DEFAULT_SECRET {
            let is_production = std::env::var("RUST_ENV")
                .map(|v| v == "production" || v == "prod")
                .unwrap_or(false);

            if is_production {
                tracing::error!(
                    "SECURITY: Using default JWT secret in production! Set JWT_SECRET environment variable."
                );
            } else {
                tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
            }
        }

        Self {
            secret,
            expiration_hours: std::env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|h: &i64| *h > 0)
                .unwrap_or(defaults.expiration_hours),
            issuer: std::env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
        }
    }
}

/// Wire format of the token payload.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user_id
    email: String,
    role: Role,
    exp: i64,
    iat: i64,
    iss: String,
}

/// JWT-based token service.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            encoding_key,
            decoding_key,
            config,
        }
    }
}

impl TokenService for JwtTokenService {
    fn generate_token(&self, user_id: Uuid, email: &str, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + TimeDelta::hours(self.config.expiration_hours);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        let user_id = Uuid::parse_str(&token_data.claims.sub)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(TokenClaims {
            user_id,
            email: token_data.claims.email,
            role: token_data.claims.role,
            exp: token_data.claims.exp,
        })
    }

    fn expiration_seconds(&self) -> i64 {
        self.config.expiration_hours * 3600
    }
}
