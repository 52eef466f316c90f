//! Stakehouse Backend Library
//!
//! Core of the pooled poker-staking finance tracker: account balances
//! across platforms, the reload and withdrawal workflows, the reload
//! payback engine and the history-backed reporting reads. The HTTP layer
//! consumes this crate through the services and the event bus.

pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod models;
pub mod repositories;
pub mod services;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use events::{EventBus, LedgerEvent};

use database::Database;
use repositories::*;
use std::sync::Arc;

/// Application state containing all repositories
pub struct AppState {
    pub database: Database,
    pub user_repo: Arc<UserRepository>,
    pub platform_repo: Arc<PlatformRepository>,
    pub account_repo: Arc<AccountRepository>,
    pub reload_repo: Arc<ReloadRepository>,
    pub withdrawal_repo: Arc<WithdrawalRepository>,
    pub transaction_repo: Arc<TransactionRepository>,
    pub history_repo: Arc<HistoryRepository>,
}

impl AppState {
    /// Create a new AppState with initialized repositories
    pub fn new(pool: sqlx::PgPool) -> Self {
        let database = Database::new(pool.clone());

        Self {
            database,
            user_repo: Arc::new(UserRepository::new(pool.clone())),
            platform_repo: Arc::new(PlatformRepository::new(pool.clone())),
            account_repo: Arc::new(AccountRepository::new(pool.clone())),
            reload_repo: Arc::new(ReloadRepository::new(pool.clone())),
            withdrawal_repo: Arc::new(WithdrawalRepository::new(pool.clone())),
            transaction_repo: Arc::new(TransactionRepository::new(pool.clone())),
            history_repo: Arc::new(HistoryRepository::new(pool)),
        }
    }
}
