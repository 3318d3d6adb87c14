//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! One job: the OTP time-to-live sweep, deleting expired challenges every
//! ten minutes. Expiry is also checked lazily on each verification attempt,
//! so the sweep is housekeeping, not the correctness guard.

use anyhow::Result;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use super::store::OtpStore;

/// Start the scheduler with the OTP expiry sweep.
pub async fn start_scheduler(otps: Arc<dyn OtpStore>) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let sweep_job = Job::new_async("0 */10 * * * *", move |_uuid, _lock| {
        let otps = otps.clone();
        Box::pin(async move {
            match otps.purge_expired(chrono::Utc::now()).await {
                Ok(0) => {}
                Ok(n) => tracing::info!(purged = n, "Expired OTP challenges swept"),
                Err(e) => tracing::error!(error = %e, "OTP sweep failed"),
            }
        })
    })?;

    scheduler.add(sweep_job).await?;
    scheduler.start().await?;

    Ok(scheduler)
}
