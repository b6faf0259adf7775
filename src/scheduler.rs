//! Background runner for the periodic jobs.
//!
//! Every job gets its own tokio task driven by an interval. A tick that
//! arrives while the previous run of the same job is still in progress is
//! skipped, so a job never overlaps with itself. Jobs do not wait on each
//! other.

use anyhow::{ensure, Result};
use chrono::{DateTime, Utc};
use compute::{Job, JobReport};
use sea_orm::DatabaseConnection;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

/// Handle to the running job loops.
pub struct Scheduler {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawns one loop per job. The first run of every job starts immediately.
    pub fn start(db: DatabaseConnection, jobs: Vec<Arc<dyn Job>>, period: Duration) -> Result<Self> {
        ensure!(!period.is_zero(), "Scheduler period must be greater than zero");

        let (shutdown, receiver) = watch::channel(false);
        let handles = jobs
            .into_iter()
            .map(|job| {
                info!("Scheduling job '{}' every {:?}", job.name(), period);
                tokio::spawn(job_loop(db.clone(), job, period, receiver.clone()))
            })
            .collect();

        Ok(Self { shutdown, handles })
    }

    /// Stops all loops and waits for them to exit. Runs already in flight
    /// finish on their own.
    pub async fn shutdown(self) {
        info!("Stopping scheduler");
        if self.shutdown.send(true).is_err() {
            debug!("All job loops already stopped");
        }
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Job loop terminated abnormally: {}", e);
            }
        }
        info!("Scheduler stopped");
    }
}

/// Clears the running flag when a run ends, including on panic.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

async fn job_loop(
    db: DatabaseConnection,
    job: Arc<dyn Job>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let running = Arc::new(AtomicBool::new(false));
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if running
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    warn!("Job '{}' is still running, skipping this tick", job.name());
                    continue;
                }

                let guard = RunningGuard(Arc::clone(&running));
                let db = db.clone();
                let job = Arc::clone(&job);
                tokio::spawn(async move {
                    let _guard = guard;
                    let _ = run_once(&db, job.as_ref(), Utc::now()).await;
                });
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    debug!("Job loop for '{}' exiting", job.name());
                    break;
                }
            }
        }
    }
}

/// Runs one job and logs its outcome.
pub async fn run_once(
    db: &DatabaseConnection,
    job: &dyn Job,
    now: DateTime<Utc>,
) -> compute::Result<JobReport> {
    trace!("Starting job '{}'", job.name());
    match job.run(db, now).await {
        Ok(report) => {
            info!("Job '{}' finished: {}", job.name(), report);
            Ok(report)
        }
        Err(e) => {
            error!("Job '{}' failed: {}", job.name(), e);
            Err(e)
        }
    }
}

/// Runs every job once, one after another.
pub async fn run_all_once(
    db: &DatabaseConnection,
    jobs: &[Arc<dyn Job>],
    now: DateTime<Utc>,
) -> Vec<(&'static str, compute::Result<JobReport>)> {
    let mut outcomes = Vec::with_capacity(jobs.len());
    for job in jobs {
        outcomes.push((job.name(), run_once(db, job.as_ref(), now).await));
    }
    outcomes
}
