use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::{info, instrument};

use model::entities::notification;

use super::{Job, JobReport};
use crate::error::{ComputeError, Result};

pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Deletes notifications created more than `retention_days` before `now`.
/// Returns the number of deleted rows.
#[instrument(skip(db))]
pub async fn cleanup_old_notifications(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
    retention_days: i64,
) -> Result<u64> {
    if retention_days < 0 {
        return Err(ComputeError::Validation(format!(
            "Retention must not be negative, got {} days",
            retention_days
        )));
    }
    let cutoff = Duration::try_days(retention_days)
        .and_then(|retention| now.checked_sub_signed(retention))
        .ok_or_else(|| ComputeError::Date(format!("Retention of {} days is out of range", retention_days)))?;

    let result = notification::Entity::delete_many()
        .filter(notification::Column::CreatedAt.lt(cutoff))
        .exec(db)
        .await?;

    info!("Removed {} notifications older than {}", result.rows_affected, cutoff);
    Ok(result.rows_affected)
}

/// Scheduler wrapper around [`cleanup_old_notifications`].
#[derive(Debug, Clone)]
pub struct NotificationCleanupJob {
    retention_days: i64,
}

impl NotificationCleanupJob {
    pub fn new(retention_days: i64) -> Self {
        Self { retention_days }
    }
}

#[async_trait]
impl Job for NotificationCleanupJob {
    fn name(&self) -> &'static str {
        "notification_cleanup"
    }

    async fn run(&self, db: &DatabaseConnection, now: DateTime<Utc>) -> Result<JobReport> {
        let deleted = cleanup_old_notifications(db, now, self.retention_days).await?;
        Ok(JobReport {
            deleted,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications;
    use crate::testing::*;
    use crate::error::Result;
    use sea_orm::{ActiveModelTrait, PaginatorTrait};

    #[tokio::test]
    async fn test_only_old_notifications_are_removed() -> Result<()> {
        let db = setup_db().await?;
        let user = new_user(&db).await?;
        let now = d(2024, 6, 30).and_hms_opt(12, 0, 0).unwrap().and_utc();

        for age in [45, 31, 29, 0] {
            let created_at = now - Duration::days(age);
            notifications::daily_digest(user.id, created_at.date_naive(), dec(1), dec(1), "USD", created_at)
                .insert(&db)
                .await?;
        }

        let deleted = NotificationCleanupJob::new(DEFAULT_RETENTION_DAYS)
            .run(&db, now)
            .await?
            .deleted;
        assert_eq!(deleted, 2);
        assert_eq!(notification::Entity::find().count(&db).await?, 2);

        assert!(matches!(
            cleanup_old_notifications(&db, now, -1).await,
            Err(ComputeError::Validation(_))
        ));
        Ok(())
    }
}
