//! Health check endpoint.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    pub timestamp: String,
}

/// Health check endpoint - returns server status.
///
/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let database = database_status(&state).await;

    let response = HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        database,
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    HttpResponse::Ok().json(response)
}

#[cfg(feature = "postgres")]
async fn database_status(state: &AppState) -> &'static str {
    match &state.db {
        Some(db) => match db.ping().await {
            Ok(()) => "connected",
            Err(e) => {
                tracing::warn!(error = %e, "Database ping failed");
                "unreachable"
            }
        },
        None => "in-memory",
    }
}

#[cfg(not(feature = "postgres"))]
async fn database_status(_state: &AppState) -> &'static str {
    "in-memory"
}
