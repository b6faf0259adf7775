use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};
use tracing::{info, instrument, warn};

use model::entities::{category, user};

use crate::error::{ComputeError, Result};

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// Creates a user and seeds the default categories in the same transaction.
#[instrument(skip(db, input), fields(email = %input.email))]
pub async fn create_user(db: &DatabaseConnection, input: NewUser) -> Result<(user::Model, Vec<category::Model>)> {
    let name = input.name.trim().to_string();
    let email = input.email.trim().to_lowercase();
    if name.is_empty() {
        return Err(ComputeError::Validation("Name must not be empty".to_string()));
    }
    if !email.contains('@') {
        return Err(ComputeError::Validation(format!("Invalid email '{}'", email)));
    }

    let txn = db.begin().await?;

    let taken = user::Entity::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .count(&txn)
        .await?;
    if taken > 0 {
        warn!("Email {} is already registered", email);
        return Err(ComputeError::Conflict(format!("Email '{}' is already registered", email)));
    }

    let created = user::ActiveModel {
        name: Set(name),
        email: Set(email),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let categories = category::seed_default_categories(&txn, created.id).await?;
    txn.commit().await?;

    info!("Created user {} with {} categories", created.id, categories.len());
    Ok((created, categories))
}

#[instrument(skip(db))]
pub async fn get_user(db: &DatabaseConnection, user_id: i32) -> Result<user::Model> {
    user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| ComputeError::NotFound(format!("User {} not found", user_id)))
}
