//! Budget tracking and reporting logic on top of the `model` entities.
//!
//! Handlers and the scheduler call into this crate; it never caches
//! derived values, every figure is recomputed from the transactions.

pub mod budget;
pub mod calendar;
pub mod categories;
pub mod error;
pub mod jobs;
pub mod notifications;
pub mod reports;
pub mod transactions;
pub mod users;

#[cfg(test)]
mod testing;

pub use budget::{check_overlap, compute_spent, evaluate_alert, AlertEvent};
pub use error::{ComputeError, Result};
pub use jobs::{default_jobs, Job, JobReport};
