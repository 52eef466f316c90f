pub mod ledger;
pub mod payback;
pub mod reloads;
pub mod reporting;
pub mod sweep;
pub mod transactions;
pub mod withdrawals;

pub use ledger::LedgerService;
pub use payback::PaybackService;
pub use reloads::ReloadService;
pub use reporting::ReportingService;
pub use sweep::SweepService;
pub use transactions::TransactionService;
pub use withdrawals::WithdrawalService;
