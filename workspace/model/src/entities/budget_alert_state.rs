use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How far past its threshold a budget is.
///
/// Variants are declared in escalation order so `Ord` compares severity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum AlertBand {
    /// Threshold reached, still under the cap.
    #[sea_orm(string_value = "warning")]
    Warning,
    /// Spending equals the cap exactly.
    #[sea_orm(string_value = "limit")]
    Limit,
    /// Spending is over the cap.
    #[sea_orm(string_value = "exceeded")]
    Exceeded,
}

/// Remembers the last alert emitted for a budget so the scheduler
/// does not repeat it every cycle.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "budget_alert_states")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub budget_id: i32,
    /// Budget period the alert was emitted for. A different period re-arms the alert.
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// Highest band already notified within the period.
    pub band: AlertBand,
    pub notified_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::budget::Entity",
        from = "Column::BudgetId",
        to = "super::budget::Column::Id",
        on_delete = "Cascade"
    )]
    Budget,
}

impl Related<super::budget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// True if the stored state was recorded for the given budget period.
    pub fn is_same_period(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.period_start == start && self.period_end == end
    }
}
