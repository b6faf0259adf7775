use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Income/expense totals over a closed date range.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PeriodTotals {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    /// Income minus expense
    pub net: Decimal,
    pub transaction_count: u64,
}

/// Direction of a trend with a zero-width stable band.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increase,
    Decrease,
    Stable,
}

/// Change between a current and a previous aggregation period.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Trend {
    /// The previous period total was zero, so no ratio exists.
    NoPreviousData,
    Change {
        /// Percentage change rounded to two decimals
        percentage: Decimal,
        direction: TrendDirection,
    },
}

/// Expense total of one category within a period.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CategoryBreakdownItem {
    pub category_id: i32,
    pub category_name: String,
    pub color: String,
    pub icon: String,
    pub amount: Decimal,
    /// Share of all expenses in the period, 0 when nothing was spent
    pub percentage: Decimal,
}

/// Expenses grouped by category.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CategoryBreakdown {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_expense: Decimal,
    pub items: Vec<CategoryBreakdownItem>,
}

/// One calendar month of a rolling series.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct MonthlySummary {
    /// Month key formatted `YYYY-MM`
    pub month: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub net_savings: Decimal,
}

/// Totals of a single day, used by the calendar view.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub income: Decimal,
    pub expense: Decimal,
}

/// Spending state of a budget.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct BudgetStatus {
    pub budget_id: i32,
    pub category_id: i32,
    pub category_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub amount: Decimal,
    pub spent: Decimal,
    /// Negative when overspent
    pub remaining: Decimal,
    pub percentage_used: Decimal,
}

/// Everything the dashboard shows on first load.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct DashboardSummary {
    /// Current month key formatted `YYYY-MM`
    pub month: String,
    pub current: PeriodTotals,
    pub previous: PeriodTotals,
    pub income_trend: Trend,
    pub expense_trend: Trend,
    pub net_trend: Trend,
    /// All-time income minus all-time expense
    pub balance: Decimal,
    pub budgets: Vec<BudgetStatus>,
}
