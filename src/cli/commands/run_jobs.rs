use anyhow::{bail, Result};
use chrono::Utc;
use compute::default_jobs;
use tracing::{debug, error, info, trace};

use crate::config::{initialize_app_state_with_url, SchedulerSettings};
use crate::scheduler::run_all_once;

/// Runs every background job once against the given database.
pub async fn run_jobs(database_url: &str, currency: &str, settings: &SchedulerSettings) -> Result<()> {
    trace!("Entering run_jobs function");
    debug!("Database URL: {}", database_url);
    settings.validate()?;

    let state = match initialize_app_state_with_url(database_url, currency).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            return Err(e);
        }
    };

    let jobs = default_jobs(&state.currency, settings.retention_days);
    let outcomes = run_all_once(&state.db, &jobs, Utc::now()).await;

    let failed: Vec<&str> = outcomes
        .iter()
        .filter(|(_, outcome)| outcome.is_err())
        .map(|(name, _)| *name)
        .collect();
    if !failed.is_empty() {
        bail!("Jobs failed: {}", failed.join(", "));
    }

    info!("All {} jobs completed", outcomes.len());
    Ok(())
}
