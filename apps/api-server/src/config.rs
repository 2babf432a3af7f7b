//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

#[cfg(feature = "postgres")]
use inkwell_infra::DatabaseConfig;
#[cfg(feature = "rate-limit")]
use inkwell_infra::RateLimitConfig;
use inkwell_infra::{CompletionConfig, JwtConfig, MediaConfig};

#[cfg(feature = "scheduler")]
use crate::background::SchedulerConfig;
use crate::telemetry::TelemetryConfig;

/// Application configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Public origin used in image URLs.
    pub base_url: String,
    #[cfg(feature = "postgres")]
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub completion: CompletionConfig,
    pub media: MediaConfig,
    /// `None` allows any origin.
    pub cors_allowed_origin: Option<String>,
    #[cfg(feature = "rate-limit")]
    pub rate_limit: RateLimitConfig,
    #[cfg(feature = "scheduler")]
    pub scheduler: SchedulerConfig,
    /// Staged uploads older than this are swept.
    pub staging_max_age: Duration,
    /// Return password-reset tokens in the forgot-password response.
    pub expose_reset_tokens: bool,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let base_url = env::var("BASE_URL").unwrap_or_else(|_| format!("http://localhost:{port}"));

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
            media: MediaConfig::from_env(base_url.as_str()),
            base_url,
            #[cfg(feature = "postgres")]
            database: DatabaseConfig::from_env(),
            jwt: JwtConfig::from_env(),
            completion: CompletionConfig::from_env(),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .ok()
                .filter(|o| !o.is_empty() && o != "*"),
            #[cfg(feature = "rate-limit")]
            rate_limit: RateLimitConfig::from_env(),
            #[cfg(feature = "scheduler")]
            scheduler: SchedulerConfig::from_env(),
            staging_max_age: Duration::from_secs(
                env::var("STAGING_MAX_AGE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3600),
            ),
            expose_reset_tokens: env_flag("EXPOSE_RESET_TOKENS", false),
            telemetry: TelemetryConfig::from_env(),
        }
    }
}

/// `false`/`0` disable, any other value enables.
pub fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| v != "false" && v != "0")
        .unwrap_or(default)
}
