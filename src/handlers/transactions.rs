use crate::handlers::{error_response, HandlerError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{DateTime, NaiveDate, Utc};
use compute::transactions::{self, NewTransaction, TransactionChanges, TransactionFilter};
use compute::ComputeError;
use model::entities::transaction::{self as transaction_entity, TransactionKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Request body for recording a transaction
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateTransactionRequest {
    pub category_id: i32,
    /// Strictly positive; the type decides the direction
    pub amount: Decimal,
    pub description: Option<String>,
    pub date: NaiveDate,
    /// `income` or `expense`
    #[serde(rename = "type")]
    pub kind: String,
}

/// Request body for updating a transaction
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateTransactionRequest {
    pub category_id: Option<i32>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Query parameters for listing transactions
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, IntoParams, Validate)]
pub struct TransactionQuery {
    pub category_id: Option<i32>,
    /// `income` or `expense`
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Maximum number of rows (default: all)
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u64>,
}

/// Transaction response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub id: i32,
    pub category_id: i32,
    pub amount: Decimal,
    pub description: Option<String>,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<transaction_entity::Model> for TransactionResponse {
    fn from(model: transaction_entity::Model) -> Self {
        Self {
            id: model.id,
            category_id: model.category_id,
            amount: common::round_money(model.amount),
            description: model.description,
            date: model.date,
            kind: model.kind.as_str().to_string(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn parse_kind(value: &str) -> Result<TransactionKind, HandlerError> {
    value
        .parse::<TransactionKind>()
        .map_err(|e| error_response(ComputeError::Validation(e)))
}

/// Record a transaction
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/transactions",
    tag = "transactions",
    params(("user_id" = i32, Path, description = "User ID")),
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction created successfully", body = ApiResponse<TransactionResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_transaction(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionResponse>>), HandlerError> {
    trace!("Entering create_transaction function");

    let input = NewTransaction {
        category_id: request.category_id,
        amount: request.amount,
        description: request.description,
        date: request.date,
        kind: parse_kind(&request.kind)?,
    };
    let created = transactions::create_transaction(&state.db, user_id, input)
        .await
        .map_err(error_response)?;

    info!("Transaction created successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            TransactionResponse::from(created),
            "Transaction created successfully",
        )),
    ))
}

/// List transactions newest first
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/transactions",
    tag = "transactions",
    params(("user_id" = i32, Path, description = "User ID"), TransactionQuery),
    responses(
        (status = 200, description = "Transactions retrieved successfully", body = ApiResponse<Vec<TransactionResponse>>),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_transactions(
    Path(user_id): Path<i32>,
    Valid(Query(query)): Valid<Query<TransactionQuery>>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<TransactionResponse>>>), HandlerError> {
    trace!("Entering get_transactions function");

    let kind = match query.kind.as_deref() {
        Some(value) => Some(parse_kind(value)?),
        None => None,
    };
    let filter = TransactionFilter {
        category_id: query.category_id,
        kind,
        start_date: query.start_date,
        end_date: query.end_date,
        limit: query.limit,
    };

    let models = transactions::list_transactions(&state.db, user_id, filter)
        .await
        .map_err(error_response)?;
    debug!("Retrieved {} transactions", models.len());

    let data = models.into_iter().map(TransactionResponse::from).collect();
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(data, "Transactions retrieved successfully")),
    ))
}

/// Get a transaction
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/transactions/{transaction_id}",
    tag = "transactions",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("transaction_id" = i32, Path, description = "Transaction ID"),
    ),
    responses(
        (status = 200, description = "Transaction retrieved successfully", body = ApiResponse<TransactionResponse>),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_transaction(
    Path((user_id, transaction_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionResponse>>), HandlerError> {
    let model = transactions::get_transaction(&state.db, user_id, transaction_id)
        .await
        .map_err(error_response)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            TransactionResponse::from(model),
            "Transaction retrieved successfully",
        )),
    ))
}

/// Update a transaction
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/transactions/{transaction_id}",
    tag = "transactions",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("transaction_id" = i32, Path, description = "Transaction ID"),
    ),
    request_body = UpdateTransactionRequest,
    responses(
        (status = 200, description = "Transaction updated successfully", body = ApiResponse<TransactionResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_transaction(
    Path((user_id, transaction_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
    Json(request): Json<UpdateTransactionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionResponse>>), HandlerError> {
    trace!("Entering update_transaction function");

    let kind = match request.kind.as_deref() {
        Some(value) => Some(parse_kind(value)?),
        None => None,
    };
    let changes = TransactionChanges {
        category_id: request.category_id,
        amount: request.amount,
        description: request.description,
        date: request.date,
        kind,
    };

    let updated = transactions::update_transaction(&state.db, user_id, transaction_id, changes)
        .await
        .map_err(error_response)?;

    info!("Transaction {} updated successfully", updated.id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            TransactionResponse::from(updated),
            "Transaction updated successfully",
        )),
    ))
}

/// Delete a transaction
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}/transactions/{transaction_id}",
    tag = "transactions",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("transaction_id" = i32, Path, description = "Transaction ID"),
    ),
    responses(
        (status = 200, description = "Transaction deleted successfully"),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_transaction(
    Path((user_id, transaction_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<()>>), HandlerError> {
    transactions::delete_transaction(&state.db, user_id, transaction_id)
        .await
        .map_err(error_response)?;

    info!("Transaction {} deleted successfully", transaction_id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok((), "Transaction deleted successfully")),
    ))
}
