//! Domain models for the Stakehouse backend.
//!
//! This module contains all database-backed models representing
//! the core entities of the staking ledger, plus the pure financial
//! rules (P&L, status derivation, payback planning, withdrawal split)
//! that the services and repositories share.

pub mod account;
pub mod history;
pub mod payback;
pub mod platform;
pub mod reload;
pub mod transaction;
pub mod user;
pub mod withdrawal;

// Re-export all models for convenient access
pub use account::{Account, AccountStatus};
pub use history::{BalanceHistory, ChangeReason};
pub use payback::{AccountDeduction, PaybackOutcome, PaybackStatus};
pub use platform::Platform;
pub use reload::{ReloadRequest, ReloadStatus};
pub use transaction::{Transaction, TransactionType};
pub use user::{User, UserRole};
pub use withdrawal::{WithdrawalRequest, WithdrawalStatus};
