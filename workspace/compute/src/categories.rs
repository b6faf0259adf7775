use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

use common::{percentage_of, round_money, CategoryBreakdown, CategoryBreakdownItem};
use model::entities::category::{self, is_valid_color};
use model::entities::transaction::{self, TransactionKind};
use model::entities::{budget, user};

use crate::error::{sum_amounts, ComputeError, Result};

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub color: String,
    pub icon: String,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ComputeError::Validation("Category name must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

fn validate_color(color: &str) -> Result<()> {
    if !is_valid_color(color) {
        return Err(ComputeError::Validation(format!(
            "Invalid color '{}', expected #RRGGBB",
            color
        )));
    }
    Ok(())
}

async fn find_owned(db: &DatabaseConnection, user_id: i32, category_id: i32) -> Result<category::Model> {
    category::Model::find_owned(db, user_id, category_id)
        .await?
        .ok_or_else(|| ComputeError::NotFound(format!("Category {} not found", category_id)))
}

#[instrument(skip(db, input))]
pub async fn create_category(
    db: &DatabaseConnection,
    user_id: i32,
    input: NewCategory,
) -> Result<category::Model> {
    let name = validate_name(&input.name)?;
    validate_color(&input.color)?;

    if user::Entity::find_by_id(user_id).one(db).await?.is_none() {
        return Err(ComputeError::NotFound(format!("User {} not found", user_id)));
    }

    let now = Utc::now();
    let created = category::ActiveModel {
        user_id: Set(user_id),
        name: Set(name),
        color: Set(input.color),
        icon: Set(input.icon),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Created category {} for user {}", created.id, user_id);
    Ok(created)
}

/// All categories of the user ordered by name.
#[instrument(skip(db))]
pub async fn list_categories(db: &DatabaseConnection, user_id: i32) -> Result<Vec<category::Model>> {
    let categories = category::Entity::find()
        .filter(category::Column::UserId.eq(user_id))
        .order_by_asc(category::Column::Name)
        .all(db)
        .await?;
    debug!("Found {} categories for user {}", categories.len(), user_id);
    Ok(categories)
}

#[instrument(skip(db))]
pub async fn get_category(db: &DatabaseConnection, user_id: i32, category_id: i32) -> Result<category::Model> {
    find_owned(db, user_id, category_id).await
}

#[instrument(skip(db, changes))]
pub async fn update_category(
    db: &DatabaseConnection,
    user_id: i32,
    category_id: i32,
    changes: CategoryChanges,
) -> Result<category::Model> {
    let existing = find_owned(db, user_id, category_id).await?;
    let mut active = existing.into_active_model();

    if let Some(name) = changes.name {
        active.name = Set(validate_name(&name)?);
    }
    if let Some(color) = changes.color {
        validate_color(&color)?;
        active.color = Set(color);
    }
    if let Some(icon) = changes.icon {
        active.icon = Set(icon);
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(db).await?;
    info!("Updated category {} for user {}", category_id, user_id);
    Ok(updated)
}

/// Deletes a category that no transaction or budget references.
#[instrument(skip(db))]
pub async fn delete_category(db: &DatabaseConnection, user_id: i32, category_id: i32) -> Result<()> {
    let txn = db.begin().await?;

    let existing = category::Model::find_owned(&txn, user_id, category_id)
        .await?
        .ok_or_else(|| ComputeError::NotFound(format!("Category {} not found", category_id)))?;

    let transactions = existing.find_related(transaction::Entity).count(&txn).await?;
    let budgets = existing.find_related(budget::Entity).count(&txn).await?;
    if transactions > 0 || budgets > 0 {
        warn!(
            "Refusing to delete category {}: {} transactions and {} budgets reference it",
            category_id, transactions, budgets
        );
        return Err(ComputeError::Conflict(format!(
            "Category '{}' is used by {} transactions and {} budgets",
            existing.name, transactions, budgets
        )));
    }

    existing.delete(&txn).await?;
    txn.commit().await?;

    info!("Deleted category {} for user {}", category_id, user_id);
    Ok(())
}

/// Expense totals per category between `start` and `end` (inclusive).
///
/// Every category of the user is listed, including those without expenses,
/// sorted by amount descending and then by name.
#[instrument(skip(db))]
pub async fn category_breakdown(
    db: &DatabaseConnection,
    user_id: i32,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<CategoryBreakdown> {
    if start > end {
        return Err(ComputeError::Validation(format!(
            "Start date {} is after end date {}",
            start, end
        )));
    }

    let categories = category::Entity::find()
        .filter(category::Column::UserId.eq(user_id))
        .all(db)
        .await?;

    let expenses = transaction::Entity::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .filter(transaction::Column::Kind.eq(TransactionKind::Expense))
        .filter(transaction::Column::Date.between(start, end))
        .all(db)
        .await?;

    let mut per_category: HashMap<i32, Decimal> = HashMap::new();
    for expense in &expenses {
        let slot = per_category.entry(expense.category_id).or_insert(Decimal::ZERO);
        *slot = sum_amounts([*slot, expense.amount], "category spending")?;
    }
    let total = sum_amounts(per_category.values().copied(), "category breakdown")?;
    debug!(
        "{} expenses over {} categories, total {}",
        expenses.len(),
        per_category.len(),
        total
    );

    let mut items: Vec<CategoryBreakdownItem> = categories
        .into_iter()
        .map(|category| {
            let amount = per_category.get(&category.id).copied().unwrap_or(Decimal::ZERO);
            CategoryBreakdownItem {
                category_id: category.id,
                category_name: category.name,
                color: category.color,
                icon: category.icon,
                amount: round_money(amount),
                percentage: percentage_of(amount, total),
            }
        })
        .collect();

    items.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.category_name.cmp(&b.category_name))
    });

    Ok(CategoryBreakdown {
        start_date: start,
        end_date: end,
        total_expense: round_money(total),
        items,
    })
}
