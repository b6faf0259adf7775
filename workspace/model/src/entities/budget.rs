use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// Default fraction of the budget that has to be spent before an alert fires.
pub const DEFAULT_ALERT_THRESHOLD: Decimal = Decimal::from_parts(8, 0, 0, false, 1);

/// A spending cap for one category over a closed date interval.
///
/// There is intentionally no `spent` column: spending is always derived
/// from the transactions inside `[start_date, end_date]`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub category_id: i32,
    /// The cap, strictly positive.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    /// First day covered by the budget (inclusive).
    pub start_date: NaiveDate,
    /// Last day covered by the budget (inclusive).
    pub end_date: NaiveDate,
    /// Fraction in (0, 1] of `amount` at which an alert fires.
    #[sea_orm(column_type = "Decimal(Some((5, 4)))")]
    pub alert_threshold: Decimal,
    #[sea_orm(default_value = "true")]
    pub alert_enabled: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
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
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "Restrict"
    )]
    Category,
    #[sea_orm(has_one = "super::budget_alert_state::Entity")]
    AlertState,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::budget_alert_state::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlertState.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// True if `date` falls inside the budget period.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// True if the closed interval `[start, end]` shares at least one day with this budget.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && self.end_date >= start
    }
}
