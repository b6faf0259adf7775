use crate::handlers::{error_response, HandlerError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{DateTime, Utc};
use compute::notifications::{self, NotificationFilter};
use compute::ComputeError;
use model::entities::notification::{self as notification_entity, NotificationKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Query parameters for listing notifications
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, IntoParams, Validate)]
pub struct NotificationQuery {
    /// Only unread notifications (default: false)
    pub unread_only: Option<bool>,
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<u64>,
}

/// Notification response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponse {
    pub id: i32,
    /// `budget_alert` or `system`
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    /// Structured data, tagged by `kind`
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
}

impl TryFrom<notification_entity::Model> for NotificationResponse {
    type Error = ComputeError;

    fn try_from(model: notification_entity::Model) -> Result<Self, Self::Error> {
        let kind = match model.kind {
            NotificationKind::BudgetAlert => "budget_alert",
            NotificationKind::System => "system",
        };
        let payload = serde_json::to_value(&model.payload)
            .map_err(|e| ComputeError::Runtime(format!("Cannot encode notification payload: {}", e)))?;

        Ok(Self {
            id: model.id,
            kind: kind.to_string(),
            title: model.title,
            message: model.message,
            is_read: model.is_read,
            created_at: model.created_at,
            payload,
        })
    }
}

/// Notifications plus the number still unread
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: u64,
}

/// Marked-read counter
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

/// List notifications newest first
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/notifications",
    tag = "notifications",
    params(("user_id" = i32, Path, description = "User ID"), NotificationQuery),
    responses(
        (status = 200, description = "Notifications retrieved successfully", body = ApiResponse<NotificationListResponse>),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_notifications(
    Path(user_id): Path<i32>,
    Valid(Query(query)): Valid<Query<NotificationQuery>>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<NotificationListResponse>>), HandlerError> {
    trace!("Entering get_notifications function");

    let filter = NotificationFilter {
        unread_only: query.unread_only.unwrap_or(false),
        limit: query.limit,
    };
    let models = notifications::list_notifications(&state.db, user_id, filter)
        .await
        .map_err(error_response)?;
    let unread_count = notifications::unread_count(&state.db, user_id)
        .await
        .map_err(error_response)?;
    debug!("Retrieved {} notifications, {} unread", models.len(), unread_count);

    let notifications = models
        .into_iter()
        .map(NotificationResponse::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(error_response)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            NotificationListResponse {
                notifications,
                unread_count,
            },
            "Notifications retrieved successfully",
        )),
    ))
}

/// Mark one notification as read
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/notifications/{notification_id}/read",
    tag = "notifications",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("notification_id" = i32, Path, description = "Notification ID"),
    ),
    responses(
        (status = 200, description = "Notification marked as read", body = ApiResponse<NotificationResponse>),
        (status = 404, description = "Notification not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn mark_notification_read(
    Path((user_id, notification_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<NotificationResponse>>), HandlerError> {
    let model = notifications::mark_read(&state.db, user_id, notification_id)
        .await
        .map_err(error_response)?;
    let response = NotificationResponse::try_from(model).map_err(error_response)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(response, "Notification marked as read")),
    ))
}

/// Mark every notification of the user as read
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/notifications/read-all",
    tag = "notifications",
    params(("user_id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Notifications marked as read", body = ApiResponse<MarkAllReadResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn mark_all_notifications_read(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<MarkAllReadResponse>>), HandlerError> {
    let updated = notifications::mark_all_read(&state.db, user_id)
        .await
        .map_err(error_response)?;

    info!("Marked {} notifications as read for user {}", updated, user_id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            MarkAllReadResponse { updated },
            "All notifications marked as read",
        )),
    ))
}

/// Delete a notification
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}/notifications/{notification_id}",
    tag = "notifications",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("notification_id" = i32, Path, description = "Notification ID"),
    ),
    responses(
        (status = 200, description = "Notification deleted successfully"),
        (status = 404, description = "Notification not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_notification(
    Path((user_id, notification_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<()>>), HandlerError> {
    notifications::delete_notification(&state.db, user_id, notification_id)
        .await
        .map_err(error_response)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok((), "Notification deleted successfully")),
    ))
}
