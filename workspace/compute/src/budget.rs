//! Budget engine: spending derivation, overlap detection and alert evaluation.
//!
//! Spending is never stored. Every caller recomputes it from the expense
//! transactions inside the requested interval.

pub mod service;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Serialize;
use tracing::{debug, instrument, trace, warn};

use common::{percentage_of, round_money};
use model::entities::budget;
use model::entities::budget_alert_state::AlertBand;
use model::entities::transaction::{self, TransactionKind};

use crate::error::{sum_amounts, Result};

/// A budget that has crossed its alert threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertEvent {
    pub budget_id: i32,
    pub category_id: i32,
    /// Threshold fraction configured on the budget.
    pub threshold: Decimal,
    /// `spent / amount * 100`, rounded to two decimals.
    pub percentage: Decimal,
    /// `amount - spent`, negative once overspent.
    pub amount_remaining: Decimal,
    pub spent: Decimal,
    pub band: AlertBand,
}

/// Sum of expense amounts for one user and category with `start <= date <= end`.
///
/// Income never counts against a budget. An empty or inverted range yields zero.
#[instrument(skip(db))]
pub async fn compute_spent<C>(
    db: &C,
    user_id: i32,
    category_id: i32,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    if start > end {
        trace!("Inverted range, nothing spent");
        return Ok(Decimal::ZERO);
    }

    let expenses = transaction::Entity::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .filter(transaction::Column::CategoryId.eq(category_id))
        .filter(transaction::Column::Kind.eq(TransactionKind::Expense))
        .filter(transaction::Column::Date.between(start, end))
        .all(db)
        .await?;

    let spent = sum_amounts(expenses.iter().map(|t| t.amount), "budget spending")?;
    trace!("{} expenses summing to {}", expenses.len(), spent);
    Ok(spent)
}

/// True if another budget of the same user and category shares at least one day with `[start, end]`.
///
/// `exclude_budget_id` lets an update ignore the budget being edited.
#[instrument(skip(db))]
pub async fn check_overlap<C>(
    db: &C,
    user_id: i32,
    category_id: i32,
    start: NaiveDate,
    end: NaiveDate,
    exclude_budget_id: Option<i32>,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let mut query = budget::Entity::find()
        .filter(budget::Column::UserId.eq(user_id))
        .filter(budget::Column::CategoryId.eq(category_id))
        .filter(budget::Column::StartDate.lte(end))
        .filter(budget::Column::EndDate.gte(start));

    if let Some(id) = exclude_budget_id {
        query = query.filter(budget::Column::Id.ne(id));
    }

    let overlapping = query.count(db).await?;
    debug!("Found {} overlapping budgets", overlapping);
    Ok(overlapping > 0)
}

/// Classifies a spend ratio that is already at or above the threshold.
pub fn band_for_ratio(ratio: Decimal) -> AlertBand {
    if ratio > Decimal::ONE {
        AlertBand::Exceeded
    } else if ratio == Decimal::ONE {
        AlertBand::Limit
    } else {
        AlertBand::Warning
    }
}

/// Decides whether `spent` puts the budget past its alert threshold.
///
/// Pure: the result depends only on the budget's amount, threshold and flag.
pub fn evaluate_alert(budget: &budget::Model, spent: Decimal) -> Option<AlertEvent> {
    if !budget.alert_enabled {
        return None;
    }
    if budget.amount <= Decimal::ZERO {
        warn!("Budget {} has a non-positive amount, skipping", budget.id);
        return None;
    }

    let ratio = match spent.checked_div(budget.amount) {
        Some(ratio) => ratio,
        None => {
            warn!("Spend ratio overflowed for budget {}", budget.id);
            return None;
        }
    };

    if ratio < budget.alert_threshold {
        return None;
    }

    Some(AlertEvent {
        budget_id: budget.id,
        category_id: budget.category_id,
        threshold: budget.alert_threshold,
        percentage: percentage_of(spent, budget.amount),
        amount_remaining: round_money(budget.amount.saturating_sub(spent)),
        spent: round_money(spent),
        band: band_for_ratio(ratio),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use chrono::Utc;

    fn food_budget(amount: Decimal, threshold: Decimal, enabled: bool) -> budget::Model {
        budget::Model {
            id: 1,
            user_id: 1,
            category_id: 1,
            amount,
            start_date: d(2024, 5, 1),
            end_date: d(2024, 5, 31),
            alert_threshold: threshold,
            alert_enabled: enabled,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_alert_at_ninety_percent() {
        let budget = food_budget(dec(500), Decimal::new(8, 1), true);
        let event = evaluate_alert(&budget, dec(450)).expect("alert expected");

        assert_eq!(event.percentage, Decimal::new(9000, 2));
        assert_eq!(event.amount_remaining, Decimal::new(5000, 2));
        assert_eq!(event.band, AlertBand::Warning);
        assert_eq!(event.threshold, Decimal::new(8, 1));
    }

    #[test]
    fn test_no_alert_below_threshold() {
        let budget = food_budget(dec(500), Decimal::new(8, 1), true);
        assert_eq!(evaluate_alert(&budget, Decimal::new(39999, 2)), None);
        // Exactly at the threshold fires
        assert!(evaluate_alert(&budget, dec(400)).is_some());
    }

    #[test]
    fn test_disabled_or_empty_budget_never_alerts() {
        let disabled = food_budget(dec(500), Decimal::new(8, 1), false);
        assert_eq!(evaluate_alert(&disabled, dec(10_000)), None);

        let zero = food_budget(Decimal::ZERO, Decimal::new(8, 1), true);
        assert_eq!(evaluate_alert(&zero, dec(10)), None);
    }

    #[test]
    fn test_bands() {
        let budget = food_budget(dec(500), Decimal::new(8, 1), true);
        assert_eq!(evaluate_alert(&budget, dec(500)).unwrap().band, AlertBand::Limit);

        let over = evaluate_alert(&budget, dec(600)).unwrap();
        assert_eq!(over.band, AlertBand::Exceeded);
        assert_eq!(over.amount_remaining, Decimal::new(-10000, 2));
        assert_eq!(over.percentage, Decimal::new(12000, 2));
    }

    #[test]
    fn test_tiny_budget_amount_alerts_without_panicking() {
        // Stored before amounts were bounded; the percentage no longer fits a Decimal
        let budget = food_budget(Decimal::new(1, 25), Decimal::new(8, 1), true);
        let event = evaluate_alert(&budget, dec(1000)).expect("alert expected");

        assert_eq!(event.band, AlertBand::Exceeded);
        assert_eq!(event.percentage, Decimal::MAX);
        assert_eq!(event.spent, Decimal::new(100000, 2));
    }

    #[test]
    fn test_alert_is_monotonic_in_spending() {
        let budget = food_budget(dec(300), Decimal::new(75, 2), true);
        let mut fired = false;
        let mut last_band = None;
        for cents in (0..60_000).step_by(1_250) {
            let event = evaluate_alert(&budget, Decimal::new(cents, 2));
            if fired {
                assert!(event.is_some(), "alert stopped firing at {}", cents);
            }
            if let Some(event) = event {
                fired = true;
                if let Some(previous) = last_band {
                    assert!(event.band >= previous);
                }
                last_band = Some(event.band);
            }
        }
        assert!(fired);
    }

    #[tokio::test]
    async fn test_compute_spent_counts_only_matching_expenses() -> crate::error::Result<()> {
        let db = setup_db().await?;
        let user = new_user(&db).await?;
        let food = new_category(&db, &user, "Food & Dining").await?;
        let travel = new_category(&db, &user, "Travel").await?;

        new_expense(&db, &food, dec(100), d(2024, 5, 1)).await?;
        new_expense(&db, &food, Decimal::new(5050, 2), d(2024, 5, 31)).await?;
        new_expense(&db, &food, dec(70), d(2024, 6, 1)).await?;
        new_expense(&db, &food, dec(30), d(2024, 4, 30)).await?;
        new_expense(&db, &travel, dec(999), d(2024, 5, 10)).await?;
        new_income(&db, &food, dec(1000), d(2024, 5, 10)).await?;

        let spent = compute_spent(&db, user.id, food.id, d(2024, 5, 1), d(2024, 5, 31)).await?;
        assert_eq!(spent, Decimal::new(15050, 2));

        let none = compute_spent(&db, user.id, food.id, d(2023, 1, 1), d(2023, 1, 31)).await?;
        assert_eq!(none, Decimal::ZERO);

        let inverted = compute_spent(&db, user.id, food.id, d(2024, 5, 31), d(2024, 5, 1)).await?;
        assert_eq!(inverted, Decimal::ZERO);

        // Another user's expenses in the same category id never leak in
        let other = new_user(&db).await?;
        assert_eq!(
            compute_spent(&db, other.id, food.id, d(2024, 5, 1), d(2024, 5, 31)).await?,
            Decimal::ZERO
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_check_overlap() -> crate::error::Result<()> {
        let db = setup_db().await?;
        let user = new_user(&db).await?;
        let food = new_category(&db, &user, "Food & Dining").await?;
        let travel = new_category(&db, &user, "Travel").await?;
        let may = new_budget(&db, &food, dec(500), d(2024, 5, 1), d(2024, 5, 31)).await?;

        assert!(check_overlap(&db, user.id, food.id, d(2024, 5, 15), d(2024, 6, 15), None).await?);
        assert!(check_overlap(&db, user.id, food.id, d(2024, 5, 31), d(2024, 5, 31), None).await?);
        assert!(!check_overlap(&db, user.id, food.id, d(2024, 6, 1), d(2024, 6, 30), None).await?);
        assert!(!check_overlap(&db, user.id, travel.id, d(2024, 5, 1), d(2024, 5, 31), None).await?);
        assert!(
            !check_overlap(&db, user.id, food.id, d(2024, 5, 10), d(2024, 5, 20), Some(may.id))
                .await?
        );
        Ok(())
    }
}
