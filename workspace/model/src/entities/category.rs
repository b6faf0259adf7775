use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};
use tracing::debug;

/// A user-defined bucket for transactions and budgets.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// The user owning this category.
    pub user_id: i32,
    pub name: String,
    /// Display color as `#RRGGBB`.
    pub color: String,
    /// Emoji or icon code.
    pub icon: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transaction,
    #[sea_orm(has_many = "super::budget::Entity")]
    Budget,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transaction.def()
    }
}

impl Related<super::budget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Categories every new account starts with, as `(name, color, icon)`.
pub const DEFAULT_CATEGORIES: [(&str, &str, &str); 12] = [
    ("Food & Dining", "#FF5733", "🍽️"),
    ("Transportation", "#33FF57", "🚗"),
    ("Shopping", "#3357FF", "🛍️"),
    ("Bills & Utilities", "#FF33F5", "💡"),
    ("Entertainment", "#33FFF5", "🎮"),
    ("Health", "#F5FF33", "🏥"),
    ("Travel", "#FF8033", "✈️"),
    ("Education", "#3380FF", "📚"),
    ("Salary", "#33FF80", "💰"),
    ("Investments", "#8033FF", "📈"),
    ("Other Income", "#FF3380", "💵"),
    ("Miscellaneous", "#808080", "📌"),
];

/// Returns true for a `#` followed by exactly six hex digits.
pub fn is_valid_color(color: &str) -> bool {
    match color.strip_prefix('#') {
        Some(hex) => hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// Inserts the default category set for a freshly created user.
///
/// Meant to run on the same connection (usually a transaction) that created the user.
pub async fn seed_default_categories<C>(db: &C, user_id: i32) -> Result<Vec<Model>, DbErr>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let mut created = Vec::with_capacity(DEFAULT_CATEGORIES.len());

    for (name, color, icon) in DEFAULT_CATEGORIES {
        let category = ActiveModel {
            user_id: Set(user_id),
            name: Set(name.to_string()),
            color: Set(color.to_string()),
            icon: Set(icon.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
        created.push(category);
    }

    debug!("Seeded {} default categories for user {}", created.len(), user_id);
    Ok(created)
}

impl Model {
    /// Finds a category only if it belongs to the given user.
    pub async fn find_owned<C>(db: &C, user_id: i32, category_id: i32) -> Result<Option<Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Entity::find_by_id(category_id)
            .filter(Column::UserId.eq(user_id))
            .one(db)
            .await
    }
}
