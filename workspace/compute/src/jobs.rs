//! Periodic maintenance jobs run by the scheduler.
//!
//! Each job is idempotent: running it twice for the same day produces no
//! extra notifications. Jobs share no state and can run in any order.

pub mod budget_alerts;
pub mod daily_digest;
pub mod retention;

pub use budget_alerts::{check_budget_alerts, BudgetAlertJob};
pub use daily_digest::{generate_daily_digest, DailyDigestJob};
pub use retention::{cleanup_old_notifications, NotificationCleanupJob, DEFAULT_RETENTION_DAYS};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;

/// Counters describing one run of a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobReport {
    /// Items the job looked at (budgets, users).
    pub examined: u64,
    /// Notifications created.
    pub emitted: u64,
    /// Items that needed no action.
    pub skipped: u64,
    /// Items whose processing failed; the rest of the run continued.
    pub failed: u64,
    /// Rows removed.
    pub deleted: u64,
}

impl fmt::Display for JobReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "examined={} emitted={} skipped={} failed={} deleted={}",
            self.examined, self.emitted, self.skipped, self.failed, self.deleted
        )
    }
}

/// A unit of scheduled work.
#[async_trait]
pub trait Job: Send + Sync {
    /// Stable name used in logs.
    fn name(&self) -> &'static str;

    /// Runs the job once as of `now`.
    async fn run(&self, db: &DatabaseConnection, now: DateTime<Utc>) -> Result<JobReport>;
}

/// The three jobs the scheduler runs by default.
pub fn default_jobs(currency: &str, retention_days: i64) -> Vec<Arc<dyn Job>> {
    vec![
        Arc::new(BudgetAlertJob::new(currency)),
        Arc::new(DailyDigestJob::new(currency)),
        Arc::new(NotificationCleanupJob::new(retention_days)),
    ]
}
