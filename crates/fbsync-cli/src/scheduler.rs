//! Cron-driven sync loop for `fbsync schedule`.
//!
//! Each tick reloads the catalog from disk and runs one pass. A tick that
//! fires while the previous pass is still running is skipped.

use std::sync::Arc;

use fbsync_core::{AppConfig, YamlCatalog};
use fbsync_sellercenter::SellerCenterClient;
use tokio::sync::{watch, Mutex};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::run::{run_sync, RunOptions};

/// A running scheduler plus the guard held by an in-flight pass.
pub(crate) struct SyncScheduler {
    scheduler: JobScheduler,
    running: Arc<Mutex<()>>,
}

impl SyncScheduler {
    /// Stops scheduling new passes and waits for the in-flight one to finish.
    ///
    /// # Errors
    ///
    /// Returns [`JobSchedulerError`] if the scheduler fails to shut down.
    pub(crate) async fn shutdown(mut self) -> Result<(), JobSchedulerError> {
        self.scheduler.shutdown().await?;
        let _idle = self.running.lock().await;
        Ok(())
    }
}

/// Builds and starts the sync scheduler on `config.sync_schedule`.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the cron expression is invalid or the
/// scheduler cannot be started.
pub(crate) async fn build_scheduler(
    config: Arc<AppConfig>,
    client: Arc<SellerCenterClient>,
    options: RunOptions,
    cancel: watch::Receiver<bool>,
) -> Result<SyncScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    let running = Arc::new(Mutex::new(()));
    let schedule = config.sync_schedule.clone();

    let job_running = Arc::clone(&running);
    let job = Job::new_async(schedule.as_str(), move |_uuid, _lock| {
        let config = Arc::clone(&config);
        let client = Arc::clone(&client);
        let running = Arc::clone(&job_running);
        let options = options.clone();
        let cancel = cancel.clone();

        Box::pin(async move {
            let Ok(_guard) = running.try_lock() else {
                tracing::warn!("scheduler: previous sync pass still running; skipping tick");
                return;
            };
            let cancelled = *cancel.borrow();
            if cancelled {
                return;
            }
            run_scheduled_pass(&config, &client, &options, &cancel).await;
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    tracing::info!(schedule = %schedule, "scheduler: started");

    Ok(SyncScheduler { scheduler, running })
}

async fn run_scheduled_pass(
    config: &AppConfig,
    client: &SellerCenterClient,
    options: &RunOptions,
    cancel: &watch::Receiver<bool>,
) {
    let mut catalog = match YamlCatalog::load(&config.catalog_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(
                path = %config.catalog_path.display(),
                error = %e,
                "scheduler: failed to load catalog"
            );
            return;
        }
    };

    match run_sync(config, client, &mut catalog, options, cancel).await {
        Ok(summary) => tracing::info!(
            selected = summary.selected,
            succeeded = summary.succeeded,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "scheduler: sync pass complete"
        ),
        Err(e) => tracing::error!(error = %e, "scheduler: sync pass failed"),
    }
}
