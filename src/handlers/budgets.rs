use crate::handlers::{error_response, HandlerError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use common::{percentage_of, round_money};
use compute::budget::service::{self, BudgetChanges, BudgetFilter, BudgetWithSpending, NewBudget};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::{IntoParams, ToSchema};

/// Request body for creating a budget
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateBudgetRequest {
    pub category_id: i32,
    /// Spending cap, strictly positive
    pub amount: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Fraction in (0, 1] at which an alert fires (default: 0.8)
    pub alert_threshold: Option<Decimal>,
    /// Default: true
    pub alert_enabled: Option<bool>,
}

/// Request body for updating a budget
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateBudgetRequest {
    pub amount: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub alert_threshold: Option<Decimal>,
    pub alert_enabled: Option<bool>,
}

/// Query parameters for listing budgets
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, IntoParams)]
pub struct BudgetQuery {
    /// Only budgets ending on or after this date
    pub start_date: Option<NaiveDate>,
    /// Only budgets starting on or before this date
    pub end_date: Option<NaiveDate>,
    pub category_id: Option<i32>,
}

/// Budget with its derived spending
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BudgetResponse {
    pub id: i32,
    pub category_id: i32,
    pub category_name: String,
    pub amount: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub alert_threshold: Decimal,
    pub alert_enabled: bool,
    /// Expenses over the whole budget period
    pub current_spending: Decimal,
    /// Negative when overspent
    pub remaining: Decimal,
    pub percentage_used: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BudgetWithSpending> for BudgetResponse {
    fn from(value: BudgetWithSpending) -> Self {
        let budget = value.budget;
        Self {
            id: budget.id,
            category_id: budget.category_id,
            category_name: value.category_name,
            amount: round_money(budget.amount),
            start_date: budget.start_date,
            end_date: budget.end_date,
            alert_threshold: budget.alert_threshold,
            alert_enabled: budget.alert_enabled,
            current_spending: value.current_spending,
            remaining: round_money(budget.amount.saturating_sub(value.current_spending)),
            percentage_used: percentage_of(value.current_spending, budget.amount),
            created_at: budget.created_at,
            updated_at: budget.updated_at,
        }
    }
}

/// Create a budget for one category and period
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/budgets",
    tag = "budgets",
    params(("user_id" = i32, Path, description = "User ID")),
    request_body = CreateBudgetRequest,
    responses(
        (status = 201, description = "Budget created successfully", body = ApiResponse<BudgetResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Overlaps an existing budget", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_budget(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<CreateBudgetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BudgetResponse>>), HandlerError> {
    trace!("Entering create_budget function");

    let input = NewBudget {
        category_id: request.category_id,
        amount: request.amount,
        start_date: request.start_date,
        end_date: request.end_date,
        alert_threshold: request.alert_threshold,
        alert_enabled: request.alert_enabled,
    };
    let created = service::create_budget(&state.db, user_id, input)
        .await
        .map_err(error_response)?;

    info!("Budget created successfully with ID: {}", created.budget.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            BudgetResponse::from(created),
            "Budget created successfully",
        )),
    ))
}

/// List budgets, newest period first
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/budgets",
    tag = "budgets",
    params(("user_id" = i32, Path, description = "User ID"), BudgetQuery),
    responses(
        (status = 200, description = "Budgets retrieved successfully", body = ApiResponse<Vec<BudgetResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_budgets(
    Path(user_id): Path<i32>,
    Query(query): Query<BudgetQuery>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<BudgetResponse>>>), HandlerError> {
    trace!("Entering get_budgets function");

    let filter = BudgetFilter {
        start_date: query.start_date,
        end_date: query.end_date,
        category_id: query.category_id,
    };
    let budgets = service::list_budgets(&state.db, user_id, filter)
        .await
        .map_err(error_response)?;
    debug!("Retrieved {} budgets", budgets.len());

    let data = budgets.into_iter().map(BudgetResponse::from).collect();
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(data, "Budgets retrieved successfully")),
    ))
}

/// Get a budget
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/budgets/{budget_id}",
    tag = "budgets",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("budget_id" = i32, Path, description = "Budget ID"),
    ),
    responses(
        (status = 200, description = "Budget retrieved successfully", body = ApiResponse<BudgetResponse>),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_budget(
    Path((user_id, budget_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<BudgetResponse>>), HandlerError> {
    let budget = service::get_budget(&state.db, user_id, budget_id)
        .await
        .map_err(error_response)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            BudgetResponse::from(budget),
            "Budget retrieved successfully",
        )),
    ))
}

/// Update a budget
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/budgets/{budget_id}",
    tag = "budgets",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("budget_id" = i32, Path, description = "Budget ID"),
    ),
    request_body = UpdateBudgetRequest,
    responses(
        (status = 200, description = "Budget updated successfully", body = ApiResponse<BudgetResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 409, description = "New dates overlap another budget", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_budget(
    Path((user_id, budget_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
    Json(request): Json<UpdateBudgetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BudgetResponse>>), HandlerError> {
    trace!("Entering update_budget function");

    let changes = BudgetChanges {
        amount: request.amount,
        start_date: request.start_date,
        end_date: request.end_date,
        alert_threshold: request.alert_threshold,
        alert_enabled: request.alert_enabled,
    };
    let updated = service::update_budget(&state.db, user_id, budget_id, changes)
        .await
        .map_err(error_response)?;

    info!("Budget {} updated successfully", budget_id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            BudgetResponse::from(updated),
            "Budget updated successfully",
        )),
    ))
}

/// Delete a budget
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}/budgets/{budget_id}",
    tag = "budgets",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("budget_id" = i32, Path, description = "Budget ID"),
    ),
    responses(
        (status = 200, description = "Budget deleted successfully"),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_budget(
    Path((user_id, budget_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<()>>), HandlerError> {
    service::delete_budget(&state.db, user_id, budget_id)
        .await
        .map_err(error_response)?;

    info!("Budget {} deleted successfully", budget_id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok((), "Budget deleted successfully")),
    ))
}
