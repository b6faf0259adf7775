use common::{
    BudgetStatus, CategoryBreakdown, CategoryBreakdownItem, DailyTotal, DashboardSummary,
    MonthlySummary, PeriodTotals, Trend, TrendDirection,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

pub use common::{ApiResponse, ErrorResponse};

use crate::handlers::{
    budgets::{BudgetQuery, BudgetResponse, CreateBudgetRequest, UpdateBudgetRequest},
    categories::{CategoryResponse, CreateCategoryRequest, UpdateCategoryRequest},
    notifications::{
        MarkAllReadResponse, NotificationListResponse, NotificationQuery, NotificationResponse,
    },
    reports::{DailyQuery, DashboardQuery, DashboardResponse, DateRangeQuery, MonthlyQuery},
    transactions::{
        CreateTransactionRequest, TransactionQuery, TransactionResponse, UpdateTransactionRequest,
    },
    users::{CreateUserRequest, UserResponse},
};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// ISO 4217 code used when formatting amounts in notification text
    pub currency: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
    /// Configured display currency
    pub currency: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::users::create_user,
        crate::handlers::users::get_user,
        crate::handlers::categories::create_category,
        crate::handlers::categories::get_categories,
        crate::handlers::categories::get_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,
        crate::handlers::transactions::create_transaction,
        crate::handlers::transactions::get_transactions,
        crate::handlers::transactions::get_transaction,
        crate::handlers::transactions::update_transaction,
        crate::handlers::transactions::delete_transaction,
        crate::handlers::budgets::create_budget,
        crate::handlers::budgets::get_budgets,
        crate::handlers::budgets::get_budget,
        crate::handlers::budgets::update_budget,
        crate::handlers::budgets::delete_budget,
        crate::handlers::notifications::get_notifications,
        crate::handlers::notifications::mark_notification_read,
        crate::handlers::notifications::mark_all_notifications_read,
        crate::handlers::notifications::delete_notification,
        crate::handlers::reports::get_dashboard,
        crate::handlers::reports::get_period_totals,
        crate::handlers::reports::get_category_breakdown,
        crate::handlers::reports::get_monthly_series,
        crate::handlers::reports::get_daily_series,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            CreateUserRequest,
            UserResponse,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryResponse,
            CreateTransactionRequest,
            UpdateTransactionRequest,
            TransactionQuery,
            TransactionResponse,
            CreateBudgetRequest,
            UpdateBudgetRequest,
            BudgetQuery,
            BudgetResponse,
            NotificationQuery,
            NotificationResponse,
            NotificationListResponse,
            MarkAllReadResponse,
            DateRangeQuery,
            MonthlyQuery,
            DailyQuery,
            DashboardQuery,
            DashboardResponse,
            DashboardSummary,
            PeriodTotals,
            Trend,
            TrendDirection,
            BudgetStatus,
            CategoryBreakdown,
            CategoryBreakdownItem,
            MonthlySummary,
            DailyTotal,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "User registration"),
        (name = "categories", description = "Category management"),
        (name = "transactions", description = "Income and expense records"),
        (name = "budgets", description = "Per-category budgets with alert thresholds"),
        (name = "notifications", description = "Budget alerts and daily summaries"),
        (name = "reports", description = "Dashboard and reporting endpoints"),
    ),
    info(
        title = "BudgetRust API",
        description = "Personal budget tracking API with spending reports and budget alerts",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
