//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info,api_server=debug,inkwell_infra=debug";

/// Output format of the fmt layer, from `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    /// One JSON object per line, for log shippers.
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub format: LogFormat,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            service_name: "inkwell-api".to_string(),
        }
    }
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            format: std::env::var("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.format),
            service_name: std::env::var("SERVICE_NAME").unwrap_or(defaults.service_name),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_telemetry(config: &TelemetryConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .init(),
    }

    tracing::info!(
        service = %config.service_name,
        format = ?config.format,
        "Telemetry initialized"
    );
}
