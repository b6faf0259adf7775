use anyhow::Result;
use tracing::{debug, error, info, trace};

use crate::cli::commands::initdb::apply_migrations;
use crate::cli::commands::serve::run_server;
use crate::config::{initialize_app_state_with_url, ServerSettings};

pub async fn migrate_and_serve(settings: &ServerSettings) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations and starting server");
    debug!("Database URL: {}", settings.database_url);
    debug!("Bind address: {}", settings.bind_address);

    trace!("Initializing application state");
    let state = match initialize_app_state_with_url(&settings.database_url, &settings.currency).await {
        Ok(state) => {
            debug!("Application state initialized successfully");
            state
        }
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            return Err(e);
        }
    };

    apply_migrations(&state.db).await?;

    run_server(state, settings).await
}
