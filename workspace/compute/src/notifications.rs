use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{debug, info, instrument};

use common::format_money;
use model::entities::notification::{
    self, BudgetAlertPayload, DailyDigestPayload, NotificationPayload,
};

use crate::budget::AlertEvent;
use crate::error::{ComputeError, Result};

#[derive(Debug, Clone, Default)]
pub struct NotificationFilter {
    pub unread_only: bool,
    pub limit: Option<u64>,
}

/// Builds an unsaved budget alert notification.
pub fn budget_alert(
    user_id: i32,
    event: &AlertEvent,
    category_name: &str,
    currency: &str,
    created_at: DateTime<Utc>,
) -> notification::ActiveModel {
    let remaining = if event.amount_remaining < Decimal::ZERO {
        format!("{} over budget", format_money(event.amount_remaining.abs(), currency))
    } else {
        format!("{} remaining", format_money(event.amount_remaining, currency))
    };
    let message = format!(
        "You have used {}% of your budget for {}. {}.",
        event.percentage, category_name, remaining
    );
    let payload = NotificationPayload::BudgetAlert(BudgetAlertPayload {
        budget_id: event.budget_id,
        category_id: event.category_id,
        category_name: category_name.to_string(),
        threshold: event.threshold,
        percentage: event.percentage,
        amount_remaining: event.amount_remaining,
        band: event.band,
    });

    notification::ActiveModel {
        user_id: Set(user_id),
        kind: Set(payload.kind()),
        title: Set("Budget Alert".to_string()),
        message: Set(message),
        is_read: Set(false),
        created_at: Set(created_at),
        payload: Set(payload),
        ..Default::default()
    }
}

/// Builds an unsaved daily summary notification.
pub fn daily_digest(
    user_id: i32,
    date: NaiveDate,
    total_income: Decimal,
    total_expense: Decimal,
    currency: &str,
    created_at: DateTime<Utc>,
) -> notification::ActiveModel {
    let message = format!(
        "Yesterday's Summary:\nIncome: {}\nExpenses: {}",
        format_money(total_income, currency),
        format_money(total_expense, currency)
    );
    let payload = NotificationPayload::DailyDigest(DailyDigestPayload {
        date,
        total_income,
        total_expense,
    });

    notification::ActiveModel {
        user_id: Set(user_id),
        kind: Set(payload.kind()),
        title: Set("Daily Summary".to_string()),
        message: Set(message),
        is_read: Set(false),
        created_at: Set(created_at),
        payload: Set(payload),
        ..Default::default()
    }
}

async fn find_owned(db: &DatabaseConnection, user_id: i32, notification_id: i32) -> Result<notification::Model> {
    notification::Entity::find_by_id(notification_id)
        .filter(notification::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| ComputeError::NotFound(format!("Notification {} not found", notification_id)))
}

/// Lists notifications newest first.
#[instrument(skip(db))]
pub async fn list_notifications(
    db: &DatabaseConnection,
    user_id: i32,
    filter: NotificationFilter,
) -> Result<Vec<notification::Model>> {
    let mut query = notification::Entity::find()
        .filter(notification::Column::UserId.eq(user_id))
        .order_by_desc(notification::Column::CreatedAt)
        .order_by_desc(notification::Column::Id);

    if filter.unread_only {
        query = query.filter(notification::Column::IsRead.eq(false));
    }
    if let Some(limit) = filter.limit {
        query = query.limit(limit);
    }

    let notifications = query.all(db).await?;
    debug!("Found {} notifications for user {}", notifications.len(), user_id);
    Ok(notifications)
}

#[instrument(skip(db))]
pub async fn unread_count(db: &DatabaseConnection, user_id: i32) -> Result<u64> {
    Ok(notification::Entity::find()
        .filter(notification::Column::UserId.eq(user_id))
        .filter(notification::Column::IsRead.eq(false))
        .count(db)
        .await?)
}

#[instrument(skip(db))]
pub async fn mark_read(db: &DatabaseConnection, user_id: i32, notification_id: i32) -> Result<notification::Model> {
    let existing = find_owned(db, user_id, notification_id).await?;
    if existing.is_read {
        return Ok(existing);
    }

    let mut active = existing.into_active_model();
    active.is_read = Set(true);
    Ok(active.update(db).await?)
}

/// Marks every unread notification of the user as read, returning how many changed.
#[instrument(skip(db))]
pub async fn mark_all_read(db: &DatabaseConnection, user_id: i32) -> Result<u64> {
    let result = notification::Entity::update_many()
        .col_expr(notification::Column::IsRead, Expr::value(true))
        .filter(notification::Column::UserId.eq(user_id))
        .filter(notification::Column::IsRead.eq(false))
        .exec(db)
        .await?;

    info!("Marked {} notifications read for user {}", result.rows_affected, user_id);
    Ok(result.rows_affected)
}

#[instrument(skip(db))]
pub async fn delete_notification(db: &DatabaseConnection, user_id: i32, notification_id: i32) -> Result<()> {
    let existing = find_owned(db, user_id, notification_id).await?;
    existing.delete(db).await?;
    info!("Deleted notification {} for user {}", notification_id, user_id);
    Ok(())
}
