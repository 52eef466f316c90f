pub mod account_repository;
pub mod history_repository;
pub mod platform_repository;
pub mod reload_repository;
pub mod transaction_repository;
pub mod user_repository;
pub mod withdrawal_repository;

// Re-export all repositories for convenient access
pub use account_repository::AccountRepository;
pub use history_repository::HistoryRepository;
pub use platform_repository::PlatformRepository;
pub use reload_repository::ReloadRepository;
pub use transaction_repository::TransactionRepository;
pub use user_repository::UserRepository;
pub use withdrawal_repository::WithdrawalRepository;
