use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, Set, TransactionTrait,
};
use tracing::{debug, error, info, instrument};

use model::entities::{budget, budget_alert_state, category};

use super::{Job, JobReport};
use crate::budget::{compute_spent, evaluate_alert};
use crate::error::Result;
use crate::notifications;

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Emitted,
    Skipped,
}

/// Checks one budget and, when needed, writes the notification and the
/// dedup state in a single transaction.
async fn process_budget(
    db: &DatabaseConnection,
    budget: &budget::Model,
    category_name: &str,
    today: NaiveDate,
    currency: &str,
    now: DateTime<Utc>,
) -> Result<Outcome> {
    let txn = db.begin().await?;

    // Only what has been spent so far counts
    let spent = compute_spent(&txn, budget.user_id, budget.category_id, budget.start_date, today).await?;
    let state = budget_alert_state::Entity::find_by_id(budget.id).one(&txn).await?;

    let event = match evaluate_alert(budget, spent) {
        Some(event) => event,
        None => {
            if let Some(state) = state {
                debug!("Budget {} back under its threshold, re-arming alert", budget.id);
                state.delete(&txn).await?;
            }
            txn.commit().await?;
            return Ok(Outcome::Skipped);
        }
    };

    let should_notify = match &state {
        None => true,
        Some(state) => {
            !state.is_same_period(budget.start_date, budget.end_date) || event.band > state.band
        }
    };
    if !should_notify {
        debug!("Budget {} already notified for band {:?}", budget.id, event.band);
        txn.commit().await?;
        return Ok(Outcome::Skipped);
    }

    notifications::budget_alert(budget.user_id, &event, category_name, currency, now)
        .insert(&txn)
        .await?;

    match state {
        Some(state) => {
            let mut active = state.into_active_model();
            active.period_start = Set(budget.start_date);
            active.period_end = Set(budget.end_date);
            active.band = Set(event.band);
            active.notified_at = Set(now);
            active.update(&txn).await?;
        }
        None => {
            budget_alert_state::ActiveModel {
                budget_id: Set(budget.id),
                period_start: Set(budget.start_date),
                period_end: Set(budget.end_date),
                band: Set(event.band),
                notified_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }
    }

    txn.commit().await?;
    info!(
        "Budget {} of user {} at {}% ({:?}), notification created",
        budget.id, budget.user_id, event.percentage, event.band
    );
    Ok(Outcome::Emitted)
}

/// Evaluates every enabled budget active on `today`, across all users.
///
/// A failing budget is logged and counted; the sweep continues with the next one.
#[instrument(skip(db, now))]
pub async fn check_budget_alerts(
    db: &DatabaseConnection,
    today: NaiveDate,
    currency: &str,
    now: DateTime<Utc>,
) -> Result<JobReport> {
    let active = budget::Entity::find()
        .filter(budget::Column::AlertEnabled.eq(true))
        .filter(budget::Column::StartDate.lte(today))
        .filter(budget::Column::EndDate.gte(today))
        .find_also_related(category::Entity)
        .all(db)
        .await?;
    debug!("Checking {} active budgets", active.len());

    let mut report = JobReport::default();
    for (budget, category) in active {
        report.examined += 1;
        let category_name = category.map(|c| c.name).unwrap_or_default();

        match process_budget(db, &budget, &category_name, today, currency, now).await {
            Ok(Outcome::Emitted) => report.emitted += 1,
            Ok(Outcome::Skipped) => report.skipped += 1,
            Err(e) => {
                error!("Failed to check budget {}: {}", budget.id, e);
                report.failed += 1;
            }
        }
    }

    info!("Budget alert sweep finished: {}", report);
    Ok(report)
}

/// Scheduler wrapper around [`check_budget_alerts`].
#[derive(Debug, Clone)]
pub struct BudgetAlertJob {
    currency: String,
}

impl BudgetAlertJob {
    pub fn new(currency: &str) -> Self {
        Self {
            currency: currency.to_string(),
        }
    }
}

#[async_trait]
impl Job for BudgetAlertJob {
    fn name(&self) -> &'static str {
        "budget_alerts"
    }

    async fn run(&self, db: &DatabaseConnection, now: DateTime<Utc>) -> Result<JobReport> {
        check_budget_alerts(db, now.date_naive(), &self.currency, now).await
    }
}
