use crate::handlers::{
    budgets::{create_budget, delete_budget, get_budget, get_budgets, update_budget},
    categories::{create_category, delete_category, get_categories, get_category, update_category},
    health::health_check,
    notifications::{
        delete_notification, get_notifications, mark_all_notifications_read,
        mark_notification_read,
    },
    reports::{
        get_category_breakdown, get_daily_series, get_dashboard, get_monthly_series,
        get_period_totals,
    },
    transactions::{
        create_transaction, delete_transaction, get_transaction, get_transactions,
        update_transaction,
    },
    users::{create_user, get_user},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Users
        .route("/api/v1/users", post(create_user))
        .route("/api/v1/users/:user_id", get(get_user))
        // Categories
        .route(
            "/api/v1/users/:user_id/categories",
            get(get_categories).post(create_category),
        )
        .route(
            "/api/v1/users/:user_id/categories/:category_id",
            get(get_category).put(update_category).delete(delete_category),
        )
        // Transactions
        .route(
            "/api/v1/users/:user_id/transactions",
            get(get_transactions).post(create_transaction),
        )
        .route(
            "/api/v1/users/:user_id/transactions/:transaction_id",
            get(get_transaction)
                .put(update_transaction)
                .delete(delete_transaction),
        )
        // Budgets
        .route(
            "/api/v1/users/:user_id/budgets",
            get(get_budgets).post(create_budget),
        )
        .route(
            "/api/v1/users/:user_id/budgets/:budget_id",
            get(get_budget).put(update_budget).delete(delete_budget),
        )
        // Notifications
        .route("/api/v1/users/:user_id/notifications", get(get_notifications))
        .route(
            "/api/v1/users/:user_id/notifications/read-all",
            put(mark_all_notifications_read),
        )
        .route(
            "/api/v1/users/:user_id/notifications/:notification_id",
            axum::routing::delete(delete_notification),
        )
        .route(
            "/api/v1/users/:user_id/notifications/:notification_id/read",
            put(mark_notification_read),
        )
        // Reports
        .route("/api/v1/users/:user_id/dashboard", get(get_dashboard))
        .route("/api/v1/users/:user_id/reports/totals", get(get_period_totals))
        .route(
            "/api/v1/users/:user_id/reports/category-breakdown",
            get(get_category_breakdown),
        )
        .route("/api/v1/users/:user_id/reports/monthly", get(get_monthly_series))
        .route("/api/v1/users/:user_id/reports/daily", get(get_daily_series))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
