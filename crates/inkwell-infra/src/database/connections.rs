use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DbConn, DbErr};

/// Connection pool settings for the primary database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl DatabaseConfig {
    /// Read `DATABASE_URL` and the pool bounds. `None` when no URL is set.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty())?;
        Some(Self {
            url,
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(20),
            min_connections: std::env::var("DB_MIN_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        })
    }
}

/// Owns the database pool shared by all repositories.
pub struct DatabaseConnections {
    pub main: DbConn,
}

impl DatabaseConnections {
    /// Open the pool described by `config`.
    pub async fn init(config: &DatabaseConfig) -> Result<Self, DbErr> {
        tracing::info!("Initializing database connection...");

        let opts = ConnectOptions::new(&config.url)
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(false)
            .to_owned();

        let main = Database::connect(opts).await?;
        tracing::info!("Database connected (pool: {})", config.max_connections);

        Ok(Self { main })
    }

    /// Round-trip a trivial statement through the pool.
    pub async fn ping(&self) -> Result<(), DbErr> {
        self.main.execute_unprepared("SELECT 1").await.map(|_| ())
    }
}
