pub mod budgets;
pub mod categories;
pub mod health;
pub mod notifications;
pub mod reports;
pub mod transactions;
pub mod users;

use axum::{http::StatusCode, response::Json};
use compute::ComputeError;
use tracing::{error, warn};

use crate::schemas::ErrorResponse;

/// Error half of every handler result.
pub type HandlerError = (StatusCode, Json<ErrorResponse>);

/// Maps a compute error to its HTTP status and body.
///
/// Storage and runtime failures are logged in full but reported to the
/// client with a generic message.
pub fn error_response(err: ComputeError) -> HandlerError {
    let status = match &err {
        ComputeError::Validation(_) => StatusCode::BAD_REQUEST,
        ComputeError::NotFound(_) => StatusCode::NOT_FOUND,
        ComputeError::Conflict(_) => StatusCode::CONFLICT,
        ComputeError::Database(_) | ComputeError::Date(_) | ComputeError::Runtime(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let message = match &err {
        ComputeError::Validation(msg) | ComputeError::NotFound(msg) | ComputeError::Conflict(msg) => {
            warn!("Request rejected ({}): {}", status, msg);
            msg.clone()
        }
        internal => {
            error!("Request failed: {}", internal);
            "Internal server error".to_string()
        }
    };

    (status, Json(ErrorResponse::new(message, err.code())))
}
