//! Fixtures shared by the compute tests.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{NaiveDate, Utc};
use migration::{Migrator, MigratorTrait};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbErr, Set};

use model::entities::budget::DEFAULT_ALERT_THRESHOLD;
use model::entities::transaction::TransactionKind;
use model::entities::{budget, category, transaction, user};

pub type Result<T> = std::result::Result<T, DbErr>;

/// Installs a stderr subscriber once; verbosity comes from `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

pub async fn setup_db() -> Result<DatabaseConnection> {
    init_tracing();

    let db = Database::connect("sqlite::memory:").await?;

    // Enable foreign keys
    db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

    Migrator::up(&db, None).await?;
    Ok(db)
}

pub fn d(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// `units` whole money units with two decimals, `dec(450)` is `450.00`.
pub fn dec(units: i64) -> Decimal {
    Decimal::new(units * 100, 2)
}

/// A user with a unique email and no categories.
pub async fn new_user<C: ConnectionTrait>(db: &C) -> Result<user::Model> {
    static USER_ID: AtomicU64 = AtomicU64::new(0);

    let current_id = USER_ID.fetch_add(1, Ordering::SeqCst);
    user::ActiveModel {
        name: Set(format!("User {}", current_id)),
        email: Set(format!("user_{}@example.com", current_id)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_category<C: ConnectionTrait>(
    db: &C,
    user: &user::Model,
    name: &str,
) -> Result<category::Model> {
    let now = Utc::now();
    category::ActiveModel {
        user_id: Set(user.id),
        name: Set(name.to_string()),
        color: Set("#FF5733".to_string()),
        icon: Set("🍽️".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_transaction<C: ConnectionTrait>(
    db: &C,
    category: &category::Model,
    kind: TransactionKind,
    amount: Decimal,
    date: NaiveDate,
) -> Result<transaction::Model> {
    let now = Utc::now();
    transaction::ActiveModel {
        user_id: Set(category.user_id),
        category_id: Set(category.id),
        amount: Set(amount),
        description: Set(Some(format!("{} on {}", kind.as_str(), date))),
        date: Set(date),
        kind: Set(kind),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_expense<C: ConnectionTrait>(
    db: &C,
    category: &category::Model,
    amount: Decimal,
    date: NaiveDate,
) -> Result<transaction::Model> {
    new_transaction(db, category, TransactionKind::Expense, amount, date).await
}

pub async fn new_income<C: ConnectionTrait>(
    db: &C,
    category: &category::Model,
    amount: Decimal,
    date: NaiveDate,
) -> Result<transaction::Model> {
    new_transaction(db, category, TransactionKind::Income, amount, date).await
}

/// A budget with the default threshold and alerts enabled, written directly without checks.
pub async fn new_budget<C: ConnectionTrait>(
    db: &C,
    category: &category::Model,
    amount: Decimal,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<budget::Model> {
    let now = Utc::now();
    budget::ActiveModel {
        user_id: Set(category.user_id),
        category_id: Set(category.id),
        amount: Set(amount),
        start_date: Set(start),
        end_date: Set(end),
        alert_threshold: Set(DEFAULT_ALERT_THRESHOLD),
        alert_enabled: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}
