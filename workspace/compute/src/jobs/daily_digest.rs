use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::collections::BTreeMap;
use tracing::{debug, error, info, instrument};

use common::round_money;
use model::entities::notification::{self, NotificationKind, NotificationPayload};
use model::entities::transaction::{self, TransactionKind};

use super::{Job, JobReport};
use crate::error::{sum_amounts, ComputeError, Result};
use crate::notifications;

#[derive(Debug, Default)]
struct DayTotals {
    income: Decimal,
    expense: Decimal,
}

impl DayTotals {
    fn add(&mut self, tx: &transaction::Model) -> Result<()> {
        let slot = match tx.kind {
            TransactionKind::Income => &mut self.income,
            TransactionKind::Expense => &mut self.expense,
        };
        *slot = sum_amounts([*slot, tx.amount], "daily digest")?;
        Ok(())
    }
}

/// A digest about `date` is only ever written once `date` has started, so
/// older system notifications are never loaded.
async fn digest_exists(db: &DatabaseConnection, user_id: i32, date: NaiveDate) -> Result<bool> {
    let existing = notification::Entity::find()
        .filter(notification::Column::UserId.eq(user_id))
        .filter(notification::Column::Kind.eq(NotificationKind::System))
        .filter(notification::Column::CreatedAt.gte(date.and_time(NaiveTime::MIN).and_utc()))
        .all(db)
        .await?;

    Ok(existing.iter().any(|n| {
        matches!(&n.payload, NotificationPayload::DailyDigest(digest) if digest.date == date)
    }))
}

/// Sends each user who transacted yesterday a summary of that day.
///
/// A user who already has a digest for that date is skipped.
#[instrument(skip(db, now))]
pub async fn generate_daily_digest(
    db: &DatabaseConnection,
    today: NaiveDate,
    currency: &str,
    now: DateTime<Utc>,
) -> Result<JobReport> {
    let yesterday = today
        .pred_opt()
        .ok_or_else(|| ComputeError::Date(format!("No day before {}", today)))?;

    let rows = transaction::Entity::find()
        .filter(transaction::Column::Date.eq(yesterday))
        .all(db)
        .await?;

    let mut per_user: BTreeMap<i32, Result<DayTotals>> = BTreeMap::new();
    for tx in rows {
        let entry = per_user.entry(tx.user_id).or_insert_with(|| Ok(DayTotals::default()));
        let failed = match &mut *entry {
            Ok(totals) => totals.add(&tx).err(),
            Err(_) => None,
        };
        if let Some(e) = failed {
            *entry = Err(e);
        }
    }
    debug!("{} users transacted on {}", per_user.len(), yesterday);

    let mut report = JobReport::default();
    for (user_id, totals) in per_user {
        report.examined += 1;

        let outcome = async {
            let totals = totals?;
            if digest_exists(db, user_id, yesterday).await? {
                return Ok(false);
            }
            notifications::daily_digest(
                user_id,
                yesterday,
                round_money(totals.income),
                round_money(totals.expense),
                currency,
                now,
            )
            .insert(db)
            .await?;
            Ok::<bool, ComputeError>(true)
        }
        .await;

        match outcome {
            Ok(true) => report.emitted += 1,
            Ok(false) => report.skipped += 1,
            Err(e) => {
                error!("Failed to create daily digest for user {}: {}", user_id, e);
                report.failed += 1;
            }
        }
    }

    info!("Daily digest for {} finished: {}", yesterday, report);
    Ok(report)
}

/// Scheduler wrapper around [`generate_daily_digest`].
#[derive(Debug, Clone)]
pub struct DailyDigestJob {
    currency: String,
}

impl DailyDigestJob {
    pub fn new(currency: &str) -> Self {
        Self {
            currency: currency.to_string(),
        }
    }
}

#[async_trait]
impl Job for DailyDigestJob {
    fn name(&self) -> &'static str {
        "daily_digest"
    }

    async fn run(&self, db: &DatabaseConnection, now: DateTime<Utc>) -> Result<JobReport> {
        generate_daily_digest(db, now.date_naive(), &self.currency, now).await
    }
}
