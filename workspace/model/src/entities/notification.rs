use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

use super::budget_alert_state::AlertBand;

/// Notification category as stored in the `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[sea_orm(string_value = "budget_alert")]
    BudgetAlert,
    #[sea_orm(string_value = "system")]
    System,
}

/// Data attached to a budget alert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetAlertPayload {
    pub budget_id: i32,
    pub category_id: i32,
    pub category_name: String,
    /// Configured threshold as a fraction.
    pub threshold: Decimal,
    /// Percentage of the budget used, rounded to two decimals.
    pub percentage: Decimal,
    /// Negative when the budget is overspent.
    pub amount_remaining: Decimal,
    pub band: AlertBand,
}

/// Totals of one calendar day for one user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyDigestPayload {
    pub date: NaiveDate,
    pub total_income: Decimal,
    pub total_expense: Decimal,
}

/// Structured payload stored in the `payload` JSON column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationPayload {
    BudgetAlert(BudgetAlertPayload),
    DailyDigest(DailyDigestPayload),
    /// Plain system message without extra data.
    Message,
}

impl NotificationPayload {
    /// The `type` column value matching this payload.
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationPayload::BudgetAlert(_) => NotificationKind::BudgetAlert,
            NotificationPayload::DailyDigest(_) | NotificationPayload::Message => {
                NotificationKind::System
            }
        }
    }
}

/// A message for a user, created by the scheduler or other system events.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    #[sea_orm(column_name = "type")]
    pub kind: NotificationKind,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    #[sea_orm(default_value = "false")]
    pub is_read: bool,
    pub created_at: DateTimeUtc,
    #[sea_orm(column_type = "Json")]
    pub payload: NotificationPayload,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
