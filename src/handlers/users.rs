use crate::handlers::{error_response, HandlerError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use compute::users::{self, NewUser};
use model::entities::user;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;

/// Request body for creating a new user
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateUserRequest {
    /// Display name
    pub name: String,
    /// Email address (must be unique)
    pub email: String,
}

/// User response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            created_at: model.created_at,
        }
    }
}

/// Create a new user together with the default categories
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), HandlerError> {
    trace!("Entering create_user function");
    debug!("Creating user with email: {}", request.email);

    let input = NewUser {
        name: request.name,
        email: request.email,
    };

    match users::create_user(&state.db, input).await {
        Ok((user_model, categories)) => {
            info!(
                "User created successfully with ID: {} and {} categories",
                user_model.id,
                categories.len()
            );
            let response = ApiResponse::ok(
                UserResponse::from(user_model),
                "User created successfully",
            );
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(e) => Err(error_response(e)),
    }
}

/// Get a specific user by ID
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<UserResponse>),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), HandlerError> {
    trace!("Entering get_user function for user_id: {}", user_id);

    let user_model = users::get_user(&state.db, user_id)
        .await
        .map_err(error_response)?;

    debug!("Retrieved user {}", user_model.id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            UserResponse::from(user_model),
            "User retrieved successfully",
        )),
    ))
}
