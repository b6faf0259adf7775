//! Reporting engine: period totals, trends, monthly and daily series and the dashboard.
//!
//! Rows are fetched once per request and bucketed in memory with `Decimal`
//! arithmetic; nothing is cached between requests.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

use common::{
    percentage_of, round_money, BudgetStatus, DailyTotal, DashboardSummary, MonthlySummary,
    PeriodTotals, Trend, TrendDirection,
};
use model::entities::transaction::{self, TransactionKind};
use model::entities::{budget, category};

use crate::budget::compute_spent;
use crate::calendar::{month_window, MonthKey};
use crate::error::{sum_amounts, ComputeError, Result};
use crate::transactions::{list_transactions, TransactionFilter};

/// Upper bound for the rolling monthly series.
pub const MAX_SERIES_MONTHS: u32 = 120;

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    income: Decimal,
    expense: Decimal,
    count: u64,
}

impl Totals {
    fn add(&mut self, tx: &transaction::Model) -> Result<()> {
        let slot = match tx.kind {
            TransactionKind::Income => &mut self.income,
            TransactionKind::Expense => &mut self.expense,
        };
        *slot = slot.checked_add(tx.amount).ok_or_else(|| {
            ComputeError::Runtime(format!(
                "Amount overflow while totalling {} transactions",
                tx.kind.as_str()
            ))
        })?;
        self.count += 1;
        Ok(())
    }

    fn into_period(self, start: NaiveDate, end: NaiveDate) -> PeriodTotals {
        PeriodTotals {
            start_date: start,
            end_date: end,
            total_income: round_money(self.income),
            total_expense: round_money(self.expense),
            net: round_money(self.income.saturating_sub(self.expense)),
            transaction_count: self.count,
        }
    }
}

async fn transactions_between(
    db: &DatabaseConnection,
    user_id: i32,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<transaction::Model>> {
    let rows = transaction::Entity::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .filter(transaction::Column::Date.between(start, end))
        .order_by_asc(transaction::Column::Date)
        .all(db)
        .await?;
    debug!("Loaded {} transactions between {} and {}", rows.len(), start, end);
    Ok(rows)
}

/// Percentage change from `previous` to `current` with a zero-width stable band.
///
/// The ratio is taken against `|previous|` so a negative baseline (a net loss)
/// still reports an improvement as an increase.
pub fn trend(current: Decimal, previous: Decimal) -> Trend {
    if previous.is_zero() {
        return Trend::NoPreviousData;
    }

    let percentage = percentage_of(current.saturating_sub(previous), previous.abs());
    let direction = if percentage > Decimal::ZERO {
        TrendDirection::Increase
    } else if percentage < Decimal::ZERO {
        TrendDirection::Decrease
    } else {
        TrendDirection::Stable
    };

    Trend::Change {
        percentage,
        direction,
    }
}

/// Income, expense and net between `start` and `end` (inclusive).
#[instrument(skip(db))]
pub async fn period_totals(
    db: &DatabaseConnection,
    user_id: i32,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PeriodTotals> {
    if start > end {
        return Err(ComputeError::Validation(format!(
            "Start date {} is after end date {}",
            start, end
        )));
    }

    let mut totals = Totals::default();
    for tx in transactions_between(db, user_id, start, end).await? {
        totals.add(&tx)?;
    }
    Ok(totals.into_period(start, end))
}

/// The last `months` calendar months up to the month of `today`, oldest first.
///
/// Months without transactions are present with zeros.
#[instrument(skip(db))]
pub async fn monthly_series(
    db: &DatabaseConnection,
    user_id: i32,
    months: u32,
    today: NaiveDate,
) -> Result<Vec<MonthlySummary>> {
    if months == 0 || months > MAX_SERIES_MONTHS {
        return Err(ComputeError::Validation(format!(
            "Months must be between 1 and {}, got {}",
            MAX_SERIES_MONTHS, months
        )));
    }

    let window = month_window(MonthKey::from_date(today), months)?;
    let (first, last) = match (window.first(), window.last()) {
        (Some(first), Some(last)) => (first.first_day()?, last.last_day()?),
        _ => return Ok(Vec::new()),
    };

    let mut buckets: BTreeMap<MonthKey, Totals> =
        window.iter().map(|key| (*key, Totals::default())).collect();
    for tx in transactions_between(db, user_id, first, last).await? {
        if let Some(bucket) = buckets.get_mut(&MonthKey::from_date(tx.date)) {
            bucket.add(&tx)?;
        }
    }

    Ok(buckets
        .into_iter()
        .map(|(key, totals)| MonthlySummary {
            month: key.to_string(),
            income: round_money(totals.income),
            expense: round_money(totals.expense),
            net_savings: round_money(totals.income.saturating_sub(totals.expense)),
        })
        .collect())
}

/// Per-day income and expense for one calendar month, every day present.
#[instrument(skip(db))]
pub async fn daily_series(
    db: &DatabaseConnection,
    user_id: i32,
    year: i32,
    month: u32,
) -> Result<Vec<DailyTotal>> {
    let (start, end) = MonthKey::new(year, month)?.bounds()?;

    let mut per_day: HashMap<NaiveDate, Totals> = HashMap::new();
    for tx in transactions_between(db, user_id, start, end).await? {
        per_day.entry(tx.date).or_default().add(&tx)?;
    }

    Ok(start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|day| {
            let totals = per_day.get(&day).copied().unwrap_or_default();
            DailyTotal {
                date: day,
                income: round_money(totals.income),
                expense: round_money(totals.expense),
            }
        })
        .collect())
}

/// All-time income minus all-time expense.
#[instrument(skip(db))]
pub async fn balance(db: &DatabaseConnection, user_id: i32) -> Result<Decimal> {
    let rows = transaction::Entity::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .all(db)
        .await?;
    let total = sum_amounts(rows.iter().map(|t| t.signed_amount()), "balance")?;
    Ok(round_money(total))
}

/// The `limit` newest transactions.
#[instrument(skip(db))]
pub async fn recent_transactions(
    db: &DatabaseConnection,
    user_id: i32,
    limit: u64,
) -> Result<Vec<transaction::Model>> {
    list_transactions(
        db,
        user_id,
        TransactionFilter {
            limit: Some(limit),
            ..Default::default()
        },
    )
    .await
}

/// Budgets whose period contains `today`, with spending over the full period.
#[instrument(skip(db))]
pub async fn budget_status(
    db: &DatabaseConnection,
    user_id: i32,
    today: NaiveDate,
) -> Result<Vec<BudgetStatus>> {
    let active = budget::Entity::find()
        .filter(budget::Column::UserId.eq(user_id))
        .filter(budget::Column::StartDate.lte(today))
        .filter(budget::Column::EndDate.gte(today))
        .find_also_related(category::Entity)
        .all(db)
        .await?;

    let mut statuses = Vec::with_capacity(active.len());
    for (budget, category) in active {
        let spent = compute_spent(
            db,
            user_id,
            budget.category_id,
            budget.start_date,
            budget.end_date,
        )
        .await?;
        statuses.push(BudgetStatus {
            budget_id: budget.id,
            category_id: budget.category_id,
            category_name: category.map(|c| c.name).unwrap_or_default(),
            start_date: budget.start_date,
            end_date: budget.end_date,
            amount: round_money(budget.amount),
            spent: round_money(spent),
            remaining: round_money(budget.amount.saturating_sub(spent)),
            percentage_used: percentage_of(spent, budget.amount),
        });
    }

    statuses.sort_by(|a, b| {
        b.percentage_used
            .cmp(&a.percentage_used)
            .then_with(|| a.category_name.cmp(&b.category_name))
    });
    Ok(statuses)
}

/// Current and previous month totals, their trends, the balance and active budgets.
#[instrument(skip(db))]
pub async fn dashboard_summary(
    db: &DatabaseConnection,
    user_id: i32,
    today: NaiveDate,
) -> Result<DashboardSummary> {
    let month = MonthKey::from_date(today);
    let (current_start, current_end) = month.bounds()?;
    let (previous_start, previous_end) = month.previous()?.bounds()?;

    let current = period_totals(db, user_id, current_start, current_end).await?;
    let previous = period_totals(db, user_id, previous_start, previous_end).await?;

    debug!(
        "Dashboard for user {} in {}: {} vs {} transactions",
        user_id,
        month,
        current.transaction_count,
        previous.transaction_count
    );

    Ok(DashboardSummary {
        month: month.to_string(),
        income_trend: trend(current.total_income, previous.total_income),
        expense_trend: trend(current.total_expense, previous.total_expense),
        net_trend: trend(current.net, previous.net),
        balance: balance(db, user_id).await?,
        budgets: budget_status(db, user_id, today).await?,
        current,
        previous,
    })
}
