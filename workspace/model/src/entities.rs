//! This file serves as the root for all SeaORM entity modules.
//! Users own categories, transactions, budgets and notifications; budgets
//! additionally carry a small alert bookkeeping row used by the scheduler.

pub mod budget;
pub mod budget_alert_state;
pub mod category;
pub mod notification;
pub mod transaction;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::budget::Entity as Budget;
    pub use super::budget_alert_state::Entity as BudgetAlertState;
    pub use super::category::Entity as Category;
    pub use super::notification::Entity as Notification;
    pub use super::transaction::Entity as Transaction;
    pub use super::user::Entity as User;
}
