use crate::handlers::transactions::TransactionResponse;
use crate::handlers::{error_response, HandlerError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{Datelike, NaiveDate, Utc};
use common::{CategoryBreakdown, DailyTotal, DashboardSummary, MonthlySummary, PeriodTotals};
use compute::calendar::MonthKey;
use compute::{categories, reports};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

const DEFAULT_SERIES_MONTHS: u32 = 6;
const DEFAULT_RECENT_TRANSACTIONS: u64 = 5;

/// Date range; both ends default to the current calendar month
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, IntoParams)]
pub struct DateRangeQuery {
    /// Start date (YYYY-MM-DD)
    pub start_date: Option<NaiveDate>,
    /// End date (YYYY-MM-DD)
    pub end_date: Option<NaiveDate>,
}

/// Query parameters for the monthly series
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, IntoParams, Validate)]
pub struct MonthlyQuery {
    /// Number of months ending with the current one (default: 6)
    #[validate(range(min = 1, max = 120))]
    pub months: Option<u32>,
}

/// Query parameters for the daily calendar view
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, IntoParams, Validate)]
pub struct DailyQuery {
    /// Year (default: current year)
    #[validate(range(min = 1970, max = 9999))]
    pub year: Option<i32>,
    /// Month 1-12 (default: current month)
    #[validate(range(min = 1, max = 12))]
    pub month: Option<u32>,
}

/// Query parameters for the dashboard
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, IntoParams, Validate)]
pub struct DashboardQuery {
    /// Number of recent transactions to include (default: 5)
    #[validate(range(min = 1, max = 50))]
    pub recent: Option<u64>,
}

/// Dashboard summary with the latest transactions
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub summary: DashboardSummary,
    pub recent_transactions: Vec<TransactionResponse>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn resolve_range(query: &DateRangeQuery) -> Result<(NaiveDate, NaiveDate), HandlerError> {
    let (month_start, month_end) = MonthKey::from_date(today())
        .bounds()
        .map_err(error_response)?;
    Ok((
        query.start_date.unwrap_or(month_start),
        query.end_date.unwrap_or(month_end),
    ))
}

/// Dashboard: current vs previous month, trends, balance, budgets and recent activity
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/dashboard",
    tag = "reports",
    params(("user_id" = i32, Path, description = "User ID"), DashboardQuery),
    responses(
        (status = 200, description = "Dashboard retrieved successfully", body = ApiResponse<DashboardResponse>),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_dashboard(
    Path(user_id): Path<i32>,
    Valid(Query(query)): Valid<Query<DashboardQuery>>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<DashboardResponse>>), HandlerError> {
    trace!("Entering get_dashboard function");

    let summary = reports::dashboard_summary(&state.db, user_id, today())
        .await
        .map_err(error_response)?;
    let recent = reports::recent_transactions(
        &state.db,
        user_id,
        query.recent.unwrap_or(DEFAULT_RECENT_TRANSACTIONS),
    )
    .await
    .map_err(error_response)?;
    debug!("Dashboard for {} with {} recent transactions", summary.month, recent.len());

    let response = DashboardResponse {
        summary,
        recent_transactions: recent.into_iter().map(TransactionResponse::from).collect(),
    };
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(response, "Dashboard retrieved successfully")),
    ))
}

/// Income, expense and net over a date range
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/reports/totals",
    tag = "reports",
    params(("user_id" = i32, Path, description = "User ID"), DateRangeQuery),
    responses(
        (status = 200, description = "Totals computed successfully", body = ApiResponse<PeriodTotals>),
        (status = 400, description = "Invalid range", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_period_totals(
    Path(user_id): Path<i32>,
    Query(query): Query<DateRangeQuery>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<PeriodTotals>>), HandlerError> {
    let (start, end) = resolve_range(&query)?;
    let totals = reports::period_totals(&state.db, user_id, start, end)
        .await
        .map_err(error_response)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(totals, "Totals computed successfully")),
    ))
}

/// Expenses per category over a date range
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/reports/category-breakdown",
    tag = "reports",
    params(("user_id" = i32, Path, description = "User ID"), DateRangeQuery),
    responses(
        (status = 200, description = "Breakdown computed successfully", body = ApiResponse<CategoryBreakdown>),
        (status = 400, description = "Invalid range", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_category_breakdown(
    Path(user_id): Path<i32>,
    Query(query): Query<DateRangeQuery>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryBreakdown>>), HandlerError> {
    let (start, end) = resolve_range(&query)?;
    let breakdown = categories::category_breakdown(&state.db, user_id, start, end)
        .await
        .map_err(error_response)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(breakdown, "Breakdown computed successfully")),
    ))
}

/// Rolling monthly income and expense series
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/reports/monthly",
    tag = "reports",
    params(("user_id" = i32, Path, description = "User ID"), MonthlyQuery),
    responses(
        (status = 200, description = "Series computed successfully", body = ApiResponse<Vec<MonthlySummary>>),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_monthly_series(
    Path(user_id): Path<i32>,
    Valid(Query(query)): Valid<Query<MonthlyQuery>>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<MonthlySummary>>>), HandlerError> {
    let months = query.months.unwrap_or(DEFAULT_SERIES_MONTHS);
    let series = reports::monthly_series(&state.db, user_id, months, today())
        .await
        .map_err(error_response)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(series, "Series computed successfully")),
    ))
}

/// Per-day totals of one month for the calendar view
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/reports/daily",
    tag = "reports",
    params(("user_id" = i32, Path, description = "User ID"), DailyQuery),
    responses(
        (status = 200, description = "Daily totals computed successfully", body = ApiResponse<Vec<DailyTotal>>),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_daily_series(
    Path(user_id): Path<i32>,
    Valid(Query(query)): Valid<Query<DailyQuery>>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<DailyTotal>>>), HandlerError> {
    let now = today();
    let year = query.year.unwrap_or(now.year());
    let month = query.month.unwrap_or(now.month());

    let days = reports::daily_series(&state.db, user_id, year, month)
        .await
        .map_err(error_response)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(days, "Daily totals computed successfully")),
    ))
}
