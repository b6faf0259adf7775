use crate::handlers::{error_response, HandlerError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use compute::categories::{self, CategoryChanges, NewCategory};
use model::entities::category;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;

const DEFAULT_ICON: &str = "📌";

/// Request body for creating a category
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    /// Display color as `#RRGGBB`
    pub color: String,
    /// Emoji or icon code, defaults to 📌
    pub icon: Option<String>,
}

/// Request body for updating a category
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Category response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<category::Model> for CategoryResponse {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            color: model.color,
            icon: model.icon,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/categories",
    tag = "categories",
    params(("user_id" = i32, Path, description = "User ID")),
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created successfully", body = ApiResponse<CategoryResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_category(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponse>>), HandlerError> {
    trace!("Entering create_category function");

    let input = NewCategory {
        name: request.name,
        color: request.color,
        icon: request.icon.unwrap_or_else(|| DEFAULT_ICON.to_string()),
    };
    let created = categories::create_category(&state.db, user_id, input)
        .await
        .map_err(error_response)?;

    info!("Category created successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            CategoryResponse::from(created),
            "Category created successfully",
        )),
    ))
}

/// List the user's categories ordered by name
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/categories",
    tag = "categories",
    params(("user_id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Categories retrieved successfully", body = ApiResponse<Vec<CategoryResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_categories(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<CategoryResponse>>>), HandlerError> {
    trace!("Entering get_categories function");

    let models = categories::list_categories(&state.db, user_id)
        .await
        .map_err(error_response)?;
    debug!("Retrieved {} categories", models.len());

    let data = models.into_iter().map(CategoryResponse::from).collect();
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(data, "Categories retrieved successfully")),
    ))
}

/// Get a category
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/categories/{category_id}",
    tag = "categories",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("category_id" = i32, Path, description = "Category ID"),
    ),
    responses(
        (status = 200, description = "Category retrieved successfully", body = ApiResponse<CategoryResponse>),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_category(
    Path((user_id, category_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponse>>), HandlerError> {
    let model = categories::get_category(&state.db, user_id, category_id)
        .await
        .map_err(error_response)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            CategoryResponse::from(model),
            "Category retrieved successfully",
        )),
    ))
}

/// Update a category
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/categories/{category_id}",
    tag = "categories",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("category_id" = i32, Path, description = "Category ID"),
    ),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated successfully", body = ApiResponse<CategoryResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_category(
    Path((user_id, category_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponse>>), HandlerError> {
    trace!("Entering update_category function");

    let changes = CategoryChanges {
        name: request.name,
        color: request.color,
        icon: request.icon,
    };
    let updated = categories::update_category(&state.db, user_id, category_id, changes)
        .await
        .map_err(error_response)?;

    info!("Category {} updated successfully", updated.id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            CategoryResponse::from(updated),
            "Category updated successfully",
        )),
    ))
}

/// Delete a category that no transaction or budget uses
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}/categories/{category_id}",
    tag = "categories",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("category_id" = i32, Path, description = "Category ID"),
    ),
    responses(
        (status = 200, description = "Category deleted successfully"),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Category is still referenced", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_category(
    Path((user_id, category_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<()>>), HandlerError> {
    categories::delete_category(&state.db, user_id, category_id)
        .await
        .map_err(error_response)?;

    info!("Category {} deleted successfully", category_id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok((), "Category deleted successfully")),
    ))
}
