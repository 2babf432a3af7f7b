//! Periodic maintenance.

mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use tokio_cron_scheduler::JobSchedulerError;

use inkwell_infra::LocalImageStore;
#[cfg(feature = "rate-limit")]
use inkwell_infra::InMemoryRateLimiter;

pub use scheduler::{Scheduler, SchedulerConfig};

/// What the maintenance sweep cleans up.
pub struct MaintenanceTargets {
    pub images: Arc<LocalImageStore>,
    /// Staged uploads older than this are abandoned.
    pub staging_max_age: Duration,
    #[cfg(feature = "rate-limit")]
    pub rate_limiter: Option<Arc<InMemoryRateLimiter>>,
}

/// Build and start the scheduler with the maintenance sweep registered.
pub async fn start_maintenance(
    config: SchedulerConfig,
    targets: MaintenanceTargets,
) -> Result<Scheduler, JobSchedulerError> {
    let scheduler = Scheduler::new(config).await?;
    let targets = Arc::new(targets);

    let schedule = scheduler.config().sweep_schedule.clone();
    scheduler
        .add_cron(&schedule, move || {
            let targets = targets.clone();
            async move { run_sweep(&targets).await }
        })
        .await?;

    scheduler.start().await?;
    Ok(scheduler)
}

async fn run_sweep(targets: &MaintenanceTargets) {
    match targets.images.sweep_staging(targets.staging_max_age).await {
        Ok(0) => {}
        Ok(removed) => tracing::info!(removed, "Swept abandoned staged uploads"),
        Err(e) => tracing::warn!(error = %e, "Staging sweep failed"),
    }

    #[cfg(feature = "rate-limit")]
    if let Some(limiter) = &targets.rate_limiter {
        limiter.retain_recent();
    }
}
