//! Decimal helpers for monetary values.
//!
//! All money is carried as `rust_decimal::Decimal`; these helpers fix the
//! rounding rules used in API output and notification text.

use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{iso, Money};
use tracing::warn;

/// Rounds to cents, half away from zero, always with two decimal places.
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Most fractional digits a stored amount may carry.
pub const MAX_AMOUNT_SCALE: u32 = 4;

/// Exclusive magnitude bound of a stored amount (10^12), matching `DECIMAL(16, 4)`.
pub const MAX_AMOUNT_MAGNITUDE: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// True when `amount` fits the money column: at most four fractional digits
/// and a magnitude below 10^12.
pub fn is_storable_amount(amount: Decimal) -> bool {
    amount.normalize().scale() <= MAX_AMOUNT_SCALE && amount.abs() < MAX_AMOUNT_MAGNITUDE
}

/// Adds amounts, returning `None` instead of panicking on overflow.
pub fn checked_total<I>(amounts: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
}

/// `part / whole * 100` rounded to two decimals; zero when `whole` is zero.
///
/// `None` when the quotient does not fit a `Decimal`.
pub fn checked_percentage_of(part: Decimal, whole: Decimal) -> Option<Decimal> {
    if whole.is_zero() {
        return Some(round_money(Decimal::ZERO));
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(round_money)
}

/// Display variant of [`checked_percentage_of`] that saturates on overflow.
pub fn percentage_of(part: Decimal, whole: Decimal) -> Decimal {
    checked_percentage_of(part, whole).unwrap_or_else(|| {
        warn!("Percentage of {} over {} overflowed, saturating", part, whole);
        if part.is_sign_negative() != whole.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        }
    })
}

/// Formats an amount for humans using the ISO currency's symbol and separators.
///
/// Unknown codes fall back to USD.
pub fn format_money(amount: Decimal, currency_code: &str) -> String {
    let currency = match iso::find(currency_code) {
        Some(currency) => currency,
        None => {
            warn!("Unknown currency code '{}', falling back to USD", currency_code);
            iso::USD
        }
    };
    Money::from_decimal(round_money(amount), currency).to_string()
}
