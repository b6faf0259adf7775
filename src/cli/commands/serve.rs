use anyhow::Result;
use compute::default_jobs;
use tokio::net::TcpListener;
use tracing::{debug, error, info, trace, warn};

use crate::config::{initialize_app_state_with_url, ServerSettings};
use crate::router::create_router;
use crate::scheduler::Scheduler;
use crate::schemas::AppState;

pub async fn serve(settings: &ServerSettings) -> Result<()> {
    trace!("Entering serve function");
    info!("BudgetRust application starting up");
    debug!("Database URL: {}", settings.database_url);
    debug!("Bind address: {}", settings.bind_address);

    // Initialize application state
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

    run_server(state, settings).await
}

/// Starts the scheduler, serves HTTP until Ctrl-C, then stops the scheduler.
pub(crate) async fn run_server(state: AppState, settings: &ServerSettings) -> Result<()> {
    settings.scheduler.validate()?;

    trace!("Starting background scheduler");
    let jobs = default_jobs(&state.currency, settings.scheduler.retention_days);
    let scheduler = Scheduler::start(state.db.clone(), jobs, settings.scheduler.period()?)?;

    // Create router
    trace!("Creating application router");
    let app = create_router(state);
    debug!("Router created successfully");

    // Start server
    info!("Starting server on {}", settings.bind_address);
    let listener = match TcpListener::bind(&settings.bind_address).await {
        Ok(listener) => {
            debug!("Successfully bound to address: {}", settings.bind_address);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", settings.bind_address, e);
            scheduler.shutdown().await;
            return Err(e.into());
        }
    };

    info!("BudgetRust API server running on http://{}", settings.bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", settings.bind_address);

    trace!("Starting axum server");
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    scheduler.shutdown().await;

    if let Err(e) = served {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Server shutdown gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
