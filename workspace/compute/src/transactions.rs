use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info, instrument};

use model::entities::category;
use model::entities::transaction::{self, TransactionKind};

use crate::error::{ComputeError, Result};

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub category_id: i32,
    pub amount: Decimal,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub kind: TransactionKind,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct TransactionChanges {
    pub category_id: Option<i32>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub kind: Option<TransactionKind>,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub category_id: Option<i32>,
    pub kind: Option<TransactionKind>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<u64>,
}

fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(ComputeError::Validation(
            "Transaction amount must be greater than zero".to_string(),
        ));
    }
    if !common::is_storable_amount(amount) {
        return Err(ComputeError::Validation(format!(
            "Transaction amount must be below {} with at most {} decimal places",
            common::MAX_AMOUNT_MAGNITUDE,
            common::MAX_AMOUNT_SCALE
        )));
    }
    Ok(())
}

async fn find_owned<C>(db: &C, user_id: i32, transaction_id: i32) -> Result<transaction::Model>
where
    C: sea_orm::ConnectionTrait,
{
    transaction::Entity::find_by_id(transaction_id)
        .filter(transaction::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| ComputeError::NotFound(format!("Transaction {} not found", transaction_id)))
}

async fn ensure_category<C>(db: &C, user_id: i32, category_id: i32) -> Result<category::Model>
where
    C: sea_orm::ConnectionTrait,
{
    category::Model::find_owned(db, user_id, category_id)
        .await?
        .ok_or_else(|| ComputeError::NotFound(format!("Category {} not found", category_id)))
}

#[instrument(skip(db, input), fields(category_id = input.category_id, kind = input.kind.as_str()))]
pub async fn create_transaction(
    db: &DatabaseConnection,
    user_id: i32,
    input: NewTransaction,
) -> Result<transaction::Model> {
    validate_amount(input.amount)?;

    let txn = db.begin().await?;
    ensure_category(&txn, user_id, input.category_id).await?;

    let now = Utc::now();
    let created = transaction::ActiveModel {
        user_id: Set(user_id),
        category_id: Set(input.category_id),
        amount: Set(input.amount),
        description: Set(input.description),
        date: Set(input.date),
        kind: Set(input.kind),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!("Created transaction {} for user {}", created.id, user_id);
    Ok(created)
}

#[instrument(skip(db))]
pub async fn get_transaction(
    db: &DatabaseConnection,
    user_id: i32,
    transaction_id: i32,
) -> Result<transaction::Model> {
    find_owned(db, user_id, transaction_id).await
}

#[instrument(skip(db, changes))]
pub async fn update_transaction(
    db: &DatabaseConnection,
    user_id: i32,
    transaction_id: i32,
    changes: TransactionChanges,
) -> Result<transaction::Model> {
    if let Some(amount) = changes.amount {
        validate_amount(amount)?;
    }

    let txn = db.begin().await?;
    let existing = find_owned(&txn, user_id, transaction_id).await?;
    if let Some(category_id) = changes.category_id {
        ensure_category(&txn, user_id, category_id).await?;
    }

    let mut active = existing.into_active_model();
    if let Some(category_id) = changes.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(amount) = changes.amount {
        active.amount = Set(amount);
    }
    if let Some(description) = changes.description {
        active.description = Set(Some(description));
    }
    if let Some(date) = changes.date {
        active.date = Set(date);
    }
    if let Some(kind) = changes.kind {
        active.kind = Set(kind);
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&txn).await?;
    txn.commit().await?;

    info!("Updated transaction {} for user {}", transaction_id, user_id);
    Ok(updated)
}

#[instrument(skip(db))]
pub async fn delete_transaction(db: &DatabaseConnection, user_id: i32, transaction_id: i32) -> Result<()> {
    let existing = find_owned(db, user_id, transaction_id).await?;
    existing.delete(db).await?;
    info!("Deleted transaction {} for user {}", transaction_id, user_id);
    Ok(())
}

/// Lists transactions newest first.
#[instrument(skip(db))]
pub async fn list_transactions(
    db: &DatabaseConnection,
    user_id: i32,
    filter: TransactionFilter,
) -> Result<Vec<transaction::Model>> {
    let mut query = transaction::Entity::find().filter(transaction::Column::UserId.eq(user_id));

    if let Some(category_id) = filter.category_id {
        query = query.filter(transaction::Column::CategoryId.eq(category_id));
    }
    if let Some(kind) = filter.kind {
        query = query.filter(transaction::Column::Kind.eq(kind));
    }
    if let Some(start) = filter.start_date {
        query = query.filter(transaction::Column::Date.gte(start));
    }
    if let Some(end) = filter.end_date {
        query = query.filter(transaction::Column::Date.lte(end));
    }

    query = query
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::Id);
    if let Some(limit) = filter.limit {
        query = query.limit(limit);
    }

    let transactions = query.all(db).await?;
    debug!("Found {} transactions for user {}", transactions.len(), user_id);
    Ok(transactions)
}
