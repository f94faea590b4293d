// src/scheduler.rs

//! Calendar-scheduled sync cycles.
//!
//! One job per listing category. Overlap protection comes from the store
//! lock: a trigger firing while a cycle for the same category is still
//! running waits on the lock and then finds every branch freshly stamped,
//! so it fires nothing.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};

use crate::error::{AppError, Result};
use crate::models::{Category, ScheduleConfig};
use crate::sync::SyncEngine;

/// Register and start the two category jobs. The returned scheduler must be
/// kept alive for the lifetime of the process.
pub async fn start(engine: Arc<SyncEngine>, schedule: &ScheduleConfig) -> Result<JobScheduler> {
    let sched = JobScheduler::new().await.map_err(AppError::scheduler)?;

    for (category, cron) in [
        (Category::AvailableNow, schedule.available_now.clone()),
        (Category::OnOrder, schedule.on_order.clone()),
    ] {
        let engine = Arc::clone(&engine);
        let job = Job::new_async(cron.as_str(), move |_id, _scheduler| {
            let engine = Arc::clone(&engine);
            Box::pin(async move {
                if let Err(e) = engine.run_cycle(category).await {
                    log::error!("scheduled {} cycle failed: {}", category, e);
                }
            })
        })
        .map_err(|e| AppError::scheduler(format!("job for '{}': {}", cron, e)))?;

        sched.add(job).await.map_err(AppError::scheduler)?;
        log::info!("scheduled {} cycles on '{}'", category, cron);
    }

    sched.start().await.map_err(AppError::scheduler)?;
    Ok(sched)
}
