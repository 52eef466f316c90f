//! Stakehouse Backend Service
//!
//! Entry point for the staking ledger backend. Wires configuration, the
//! PostgreSQL pool and migrations, the repositories and services, the
//! post-commit event bus, and the daily stale-data sweep, then waits for
//! shutdown. The HTTP/SSE layer runs as a separate deployment and consumes
//! this crate as a library.

use stakehouse_backend::config::AppConfig;
use stakehouse_backend::database::{create_pool, run_migrations};
use stakehouse_backend::error::{AppError, AppResult};
use stakehouse_backend::events::EventBus;
use stakehouse_backend::services::{
    LedgerService, PaybackService, ReloadService, ReportingService, SweepService,
    TransactionService, WithdrawalService,
};
use stakehouse_backend::AppState;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        AppError::Config(e)
    })?;

    // Initialize tracing/logging with config
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("stakehouse_backend={},sqlx=warn", config.log_level).into()
            }),
        )
        .init();

    info!("Stakehouse backend starting");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log_level);

    // =========================================================================
    // DATABASE SETUP
    // =========================================================================
    info!("Connecting to database...");

    let pool = create_pool(&config.database).await.map_err(|e| {
        error!("Failed to create database pool: {}", e);
        AppError::Database(e)
    })?;

    info!("Database connection pool created successfully");
    info!("Max connections: {}", config.database.max_connections);

    // Run migrations
    info!("Running database migrations...");
    run_migrations(&pool, None).await.map_err(|e| {
        error!("Database migration failed: {}", e);
        AppError::Database(e)
    })?;

    info!("Database migrations completed successfully");

    // =========================================================================
    // CORE SERVICES INITIALIZATION
    // =========================================================================
    info!("Initializing core services...");

    let app_state = Arc::new(AppState::new(pool.clone()));
    info!("✓ Application state initialized with repositories");

    let events = Arc::new(EventBus::new());
    info!("✓ Event bus initialized");

    let _ledger = Arc::new(LedgerService::new(
        app_state.account_repo.clone(),
        app_state.platform_repo.clone(),
        events.clone(),
    ));
    let _reloads = Arc::new(ReloadService::new(
        app_state.reload_repo.clone(),
        app_state.platform_repo.clone(),
        events.clone(),
    ));
    let _payback = Arc::new(PaybackService::new(
        app_state.reload_repo.clone(),
        app_state.account_repo.clone(),
        events.clone(),
    ));
    let _withdrawals = Arc::new(WithdrawalService::new(
        app_state.withdrawal_repo.clone(),
        app_state.reload_repo.clone(),
        app_state.account_repo.clone(),
        app_state.platform_repo.clone(),
        events.clone(),
    ));
    let _transactions = Arc::new(TransactionService::new(
        app_state.transaction_repo.clone(),
        app_state.platform_repo.clone(),
    ));
    let _reporting = Arc::new(ReportingService::new(
        app_state.account_repo.clone(),
        app_state.platform_repo.clone(),
        app_state.history_repo.clone(),
        app_state.transaction_repo.clone(),
        app_state.user_repo.clone(),
    ));
    info!("✓ Ledger, workflow and reporting services initialized");

    // =========================================================================
    // BACKGROUND TASKS
    // =========================================================================
    let sweep = SweepService::new(
        app_state.account_repo.clone(),
        events.clone(),
        config.sweep_interval(),
    );
    let sweep_handle = tokio::spawn(async move {
        sweep.start().await;
    });
    info!(
        "✓ Stale-balance sweep started ({}s interval)",
        config.sweep_interval_secs
    );

    info!("Stakehouse backend ready");
    info!("Press Ctrl+C to shutdown gracefully");

    // =========================================================================
    // SHUTDOWN HANDLING
    // =========================================================================
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, shutting down gracefully...");
        }
        _ = sweep_handle => {
            error!("Sweep task exited unexpectedly");
        }
    }

    info!("Stakehouse backend shutdown complete");
    Ok(())
}
