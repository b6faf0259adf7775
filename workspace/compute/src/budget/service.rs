//! Budget CRUD. Every write runs inside one database transaction so the
//! overlap check and the write it guards are atomic.
//!
//! Writes first take a row lock on the owning category (`SELECT ... FOR UPDATE`
//! on Postgres), so two concurrent writers for one category serialize and the
//! second one sees the first one's budget in its overlap check. SQLite has no
//! row locks; its single writer already serializes the transactions.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, ModelTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
    TransactionTrait,
};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

use common::round_money;
use model::entities::budget::{self, DEFAULT_ALERT_THRESHOLD};
use model::entities::category;

use super::{check_overlap, compute_spent};
use crate::error::{ComputeError, Result};

fn locked_category_query(user_id: i32, category_id: i32) -> Select<category::Entity> {
    category::Entity::find_by_id(category_id)
        .filter(category::Column::UserId.eq(user_id))
        .lock_exclusive()
}

/// Loads the caller's category and holds its row lock until `txn` ends.
async fn lock_category<C>(txn: &C, user_id: i32, category_id: i32) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    locked_category_query(user_id, category_id)
        .one(txn)
        .await?
        .ok_or_else(|| ComputeError::NotFound(format!("Category {} not found", category_id)))
}

/// Input for a new budget.
#[derive(Debug, Clone)]
pub struct NewBudget {
    pub category_id: i32,
    pub amount: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Defaults to 0.8
    pub alert_threshold: Option<Decimal>,
    /// Defaults to true
    pub alert_enabled: Option<bool>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct BudgetChanges {
    pub amount: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub alert_threshold: Option<Decimal>,
    pub alert_enabled: Option<bool>,
}

/// Filters for listing budgets.
#[derive(Debug, Clone, Default)]
pub struct BudgetFilter {
    /// Only budgets ending on or after this day.
    pub start_date: Option<NaiveDate>,
    /// Only budgets starting on or before this day.
    pub end_date: Option<NaiveDate>,
    pub category_id: Option<i32>,
}

/// A budget annotated with what has been spent over its whole period.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetWithSpending {
    pub budget: budget::Model,
    pub category_name: String,
    /// Rounded to two decimals.
    pub current_spending: Decimal,
}

fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(ComputeError::Validation(
            "Budget amount must be greater than zero".to_string(),
        ));
    }
    if !common::is_storable_amount(amount) {
        return Err(ComputeError::Validation(format!(
            "Budget amount must be below {} with at most {} decimal places",
            common::MAX_AMOUNT_MAGNITUDE,
            common::MAX_AMOUNT_SCALE
        )));
    }
    Ok(())
}

fn validate_period(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(ComputeError::Validation(format!(
            "Budget start date {} is after end date {}",
            start, end
        )));
    }
    Ok(())
}

fn validate_threshold(threshold: Decimal) -> Result<()> {
    if threshold <= Decimal::ZERO || threshold > Decimal::ONE {
        return Err(ComputeError::Validation(format!(
            "Alert threshold must be in (0, 1], got {}",
            threshold
        )));
    }
    Ok(())
}

async fn find_owned_budget<C>(db: &C, user_id: i32, budget_id: i32) -> Result<budget::Model>
where
    C: ConnectionTrait,
{
    budget::Entity::find_by_id(budget_id)
        .filter(budget::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| ComputeError::NotFound(format!("Budget {} not found", budget_id)))
}

async fn annotate<C>(db: &C, budget: budget::Model, category_name: String) -> Result<BudgetWithSpending>
where
    C: ConnectionTrait,
{
    let spent = compute_spent(
        db,
        budget.user_id,
        budget.category_id,
        budget.start_date,
        budget.end_date,
    )
    .await?;

    Ok(BudgetWithSpending {
        budget,
        category_name,
        current_spending: round_money(spent),
    })
}

/// Creates a budget after checking ownership of the category and that no other
/// budget of the same category overlaps the new period.
#[instrument(skip(db, input), fields(category_id = input.category_id))]
pub async fn create_budget(
    db: &DatabaseConnection,
    user_id: i32,
    input: NewBudget,
) -> Result<BudgetWithSpending> {
    validate_amount(input.amount)?;
    validate_period(input.start_date, input.end_date)?;
    let threshold = input.alert_threshold.unwrap_or(DEFAULT_ALERT_THRESHOLD);
    validate_threshold(threshold)?;

    let txn = db.begin().await?;

    let category = lock_category(&txn, user_id, input.category_id).await?;

    if check_overlap(
        &txn,
        user_id,
        category.id,
        input.start_date,
        input.end_date,
        None,
    )
    .await?
    {
        warn!(
            "Rejecting budget for category {} from {} to {}: overlaps an existing budget",
            category.id, input.start_date, input.end_date
        );
        return Err(ComputeError::Conflict(format!(
            "A budget for category '{}' already covers part of {} to {}",
            category.name, input.start_date, input.end_date
        )));
    }

    let now = Utc::now();
    let created = budget::ActiveModel {
        user_id: Set(user_id),
        category_id: Set(category.id),
        amount: Set(input.amount),
        start_date: Set(input.start_date),
        end_date: Set(input.end_date),
        alert_threshold: Set(threshold),
        alert_enabled: Set(input.alert_enabled.unwrap_or(true)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let result = annotate(&txn, created, category.name).await?;
    txn.commit().await?;

    info!("Created budget {} for user {}", result.budget.id, user_id);
    Ok(result)
}

/// Applies a partial update. The overlap check only runs when a date changes.
#[instrument(skip(db, changes))]
pub async fn update_budget(
    db: &DatabaseConnection,
    user_id: i32,
    budget_id: i32,
    changes: BudgetChanges,
) -> Result<BudgetWithSpending> {
    if let Some(amount) = changes.amount {
        validate_amount(amount)?;
    }
    if let Some(threshold) = changes.alert_threshold {
        validate_threshold(threshold)?;
    }

    let txn = db.begin().await?;
    let existing = find_owned_budget(&txn, user_id, budget_id).await?;
    let category = lock_category(&txn, user_id, existing.category_id).await?;

    let start = changes.start_date.unwrap_or(existing.start_date);
    let end = changes.end_date.unwrap_or(existing.end_date);
    validate_period(start, end)?;

    let dates_changed = start != existing.start_date || end != existing.end_date;
    if dates_changed
        && check_overlap(&txn, user_id, existing.category_id, start, end, Some(existing.id)).await?
    {
        warn!("Rejecting date change of budget {}: overlaps another budget", budget_id);
        return Err(ComputeError::Conflict(format!(
            "Another budget for this category already covers part of {} to {}",
            start, end
        )));
    }

    let mut active = existing.into_active_model();
    if let Some(amount) = changes.amount {
        active.amount = Set(amount);
    }
    if dates_changed {
        active.start_date = Set(start);
        active.end_date = Set(end);
    }
    if let Some(threshold) = changes.alert_threshold {
        active.alert_threshold = Set(threshold);
    }
    if let Some(enabled) = changes.alert_enabled {
        active.alert_enabled = Set(enabled);
    }
    active.updated_at = Set(Utc::now());
    let updated = active.update(&txn).await?;

    let result = annotate(&txn, updated, category.name).await?;
    txn.commit().await?;

    info!("Updated budget {} for user {}", budget_id, user_id);
    Ok(result)
}

#[instrument(skip(db))]
pub async fn delete_budget(db: &DatabaseConnection, user_id: i32, budget_id: i32) -> Result<()> {
    let txn = db.begin().await?;
    let existing = find_owned_budget(&txn, user_id, budget_id).await?;
    existing.delete(&txn).await?;
    txn.commit().await?;

    info!("Deleted budget {} for user {}", budget_id, user_id);
    Ok(())
}

#[instrument(skip(db))]
pub async fn get_budget(
    db: &DatabaseConnection,
    user_id: i32,
    budget_id: i32,
) -> Result<BudgetWithSpending> {
    let (budget, category) = budget::Entity::find_by_id(budget_id)
        .filter(budget::Column::UserId.eq(user_id))
        .find_also_related(category::Entity)
        .one(db)
        .await?
        .ok_or_else(|| ComputeError::NotFound(format!("Budget {} not found", budget_id)))?;

    let category_name = category.map(|c| c.name).unwrap_or_default();
    annotate(db, budget, category_name).await
}

/// Lists the user's budgets, newest period first.
#[instrument(skip(db))]
pub async fn list_budgets(
    db: &DatabaseConnection,
    user_id: i32,
    filter: BudgetFilter,
) -> Result<Vec<BudgetWithSpending>> {
    let mut query = budget::Entity::find().filter(budget::Column::UserId.eq(user_id));

    if let Some(start) = filter.start_date {
        query = query.filter(budget::Column::EndDate.gte(start));
    }
    if let Some(end) = filter.end_date {
        query = query.filter(budget::Column::StartDate.lte(end));
    }
    if let Some(category_id) = filter.category_id {
        query = query.filter(budget::Column::CategoryId.eq(category_id));
    }

    let budgets = query
        .order_by_desc(budget::Column::StartDate)
        .order_by_desc(budget::Column::Id)
        .all(db)
        .await?;
    debug!("Found {} budgets for user {}", budgets.len(), user_id);

    let names: HashMap<i32, String> = category::Entity::find()
        .filter(category::Column::UserId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let mut result = Vec::with_capacity(budgets.len());
    for budget in budgets {
        let name = names.get(&budget.category_id).cloned().unwrap_or_default();
        result.push(annotate(db, budget, name).await?);
    }
    Ok(result)
}
