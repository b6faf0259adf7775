//! Common transport-layer types shared between the API and the compute crate.
//! Report and dashboard shapes live here so handlers can serialize what the
//! compute crate produces without duplicating structs.

pub mod money;
mod reports;

pub use money::{
    checked_percentage_of, checked_total, format_money, is_storable_amount, percentage_of,
    round_money, MAX_AMOUNT_MAGNITUDE, MAX_AMOUNT_SCALE,
};
pub use reports::{
    BudgetStatus, CategoryBreakdown, CategoryBreakdownItem, DailyTotal, DashboardSummary,
    MonthlySummary, PeriodTotals, Trend, TrendDirection,
};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic API response wrapper used by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            success: false,
        }
    }
}
