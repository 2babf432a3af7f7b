//! # Inkwell API Server
//!
//! The main entry point for the Actix-web HTTP server.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

use inkwell_core::ports::RateLimiter;
use inkwell_infra::LocalImageStore;
#[cfg(feature = "rate-limit")]
use inkwell_infra::InMemoryRateLimiter;

#[cfg(feature = "scheduler")]
mod background;
mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;
mod upload;

use config::AppConfig;
use middleware::error::{json_error_handler, path_error_handler, query_error_handler};
use state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    telemetry::init_telemetry(&config.telemetry);

    tracing::info!(
        "Starting Inkwell API Server on {}:{}",
        config.host,
        config.port
    );

    let images = Arc::new(LocalImageStore::new(config.media.clone()));
    images.ensure_dirs().await?;
    match images.sweep_staging(config.staging_max_age).await {
        Ok(removed) if removed > 0 => tracing::info!(removed, "Removed stale staged uploads"),
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "Initial staging sweep failed"),
    }

    let state = AppState::new(&config, images.clone()).await?;

    #[cfg(feature = "rate-limit")]
    let limiter = Arc::new(InMemoryRateLimiter::new(config.rate_limit.clone()));
    #[cfg(feature = "rate-limit")]
    let ai_limiter: Option<Arc<dyn RateLimiter>> = Some(limiter.clone());
    #[cfg(not(feature = "rate-limit"))]
    let ai_limiter: Option<Arc<dyn RateLimiter>> = None;

    #[cfg(feature = "scheduler")]
    let mut scheduler = match background::start_maintenance(
        config.scheduler.clone(),
        background::MaintenanceTargets {
            images: images.clone(),
            staging_max_age: config.staging_max_age,
            #[cfg(feature = "rate-limit")]
            rate_limiter: Some(limiter.clone()),
        },
    )
    .await
    {
        Ok(scheduler) => Some(scheduler),
        Err(e) => {
            tracing::error!(error = %e, "Failed to start scheduler");
            None
        }
    };

    let upload_dir = config.media.upload_dir.clone();
    let cors_origin = config.cors_allowed_origin.clone();

    let server = HttpServer::new(move || {
        let cors = match &cors_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header()
                .supports_credentials(),
            None => Cors::permissive(),
        };

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .service(actix_files::Files::new("/uploads", &upload_dir))
            .configure(|cfg| handlers::configure_routes(cfg, ai_limiter.clone()))
    })
    .bind((config.host.as_str(), config.port))?
    .run();

    let result = server.await;

    #[cfg(feature = "scheduler")]
    if let Some(scheduler) = scheduler.as_mut() {
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!(error = %e, "Scheduler shutdown failed");
        }
    }

    result
}
