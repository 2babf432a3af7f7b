//! Application state - shared across all handlers.

use std::sync::Arc;

use inkwell_core::ports::{
    ImageStore, PasswordService, PostRepository, TokenService, UserRepository,
};
use inkwell_core::services::AiAssistant;
#[cfg(feature = "postgres")]
use inkwell_infra::{DatabaseConnections, PostgresPostRepository, PostgresUserRepository};
use inkwell_infra::{
    Argon2PasswordService, ChatCompletionClient, InMemoryPostRepository, InMemoryUserRepository,
    JwtTokenService, LocalImageStore, MediaConfig,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub images: Arc<dyn ImageStore>,
    /// Upload limits and staging location used while reading multipart bodies.
    pub media: MediaConfig,
    pub assistant: AiAssistant,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub expose_reset_tokens: bool,
    #[cfg(feature = "postgres")]
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig, images: Arc<LocalImageStore>) -> std::io::Result<Self> {
        let client = ChatCompletionClient::new(config.completion.clone())
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        tracing::info!(model = %client.model(), "AI completion client ready");

        #[cfg(feature = "postgres")]
        let (db, users, posts) = Self::repositories(config).await;

        #[cfg(not(feature = "postgres"))]
        let (users, posts): (Arc<dyn UserRepository>, Arc<dyn PostRepository>) = {
            tracing::info!("Running without postgres feature - using in-memory repositories");
            (
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemoryPostRepository::new()),
            )
        };

        tracing::info!("Application state initialized");

        Ok(Self {
            users,
            posts,
            media: images.config().clone(),
            images,
            assistant: AiAssistant::new(Arc::new(client)),
            tokens: Arc::new(JwtTokenService::new(config.jwt.clone())),
            passwords: Arc::new(Argon2PasswordService::new()),
            expose_reset_tokens: config.expose_reset_tokens,
            #[cfg(feature = "postgres")]
            db,
        })
    }

    #[cfg(feature = "postgres")]
    async fn repositories(
        config: &AppConfig,
    ) -> (
        Option<Arc<DatabaseConnections>>,
        Arc<dyn UserRepository>,
        Arc<dyn PostRepository>,
    ) {
        let Some(db_config) = config.database.as_ref() else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return (
                None,
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemoryPostRepository::new()),
            );
        };

        match DatabaseConnections::init(db_config).await {
            Ok(connections) => {
                let conn = Arc::new(connections);
                (
                    Some(conn.clone()),
                    Arc::new(PostgresUserRepository::new(conn.main.clone())),
                    Arc::new(PostgresPostRepository::new(conn.main.clone())),
                )
            }
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                (
                    None,
                    Arc::new(InMemoryUserRepository::new()),
                    Arc::new(InMemoryPostRepository::new()),
                )
            }
        }
    }
}
