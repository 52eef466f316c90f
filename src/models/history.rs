use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Why an account balance changed. Every mutation of `current_balance`
/// appends exactly one history row carrying one of these reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    ManualUpdate,
    ReloadApproved,
    WithdrawalApproved,
    ReloadPayback,
    CloseDay,
    AccountStatusChange,
    InitialState,
}

impl ChangeReason {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "manual_update" => Ok(ChangeReason::ManualUpdate),
            "reload_approved" => Ok(ChangeReason::ReloadApproved),
            "withdrawal_approved" => Ok(ChangeReason::WithdrawalApproved),
            "reload_payback" => Ok(ChangeReason::ReloadPayback),
            "close_day" => Ok(ChangeReason::CloseDay),
            "account_status_change" => Ok(ChangeReason::AccountStatusChange),
            "initial_state" => Ok(ChangeReason::InitialState),
            _ => Err(format!("Invalid change reason: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeReason::ManualUpdate => "manual_update",
            ChangeReason::ReloadApproved => "reload_approved",
            ChangeReason::WithdrawalApproved => "withdrawal_approved",
            ChangeReason::ReloadPayback => "reload_payback",
            ChangeReason::CloseDay => "close_day",
            ChangeReason::AccountStatusChange => "account_status_change",
            ChangeReason::InitialState => "initial_state",
        }
    }
}

/// Append-only record of a balance mutation. This table is the single
/// source of truth for time-series reporting: dashboards sum
/// `new_balance - old_balance` over date ranges rather than re-deriving
/// from live account state. Rows are never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BalanceHistory {
    pub id: i64,
    pub account_id: i64,
    pub old_balance: Decimal,
    pub new_balance: Decimal,
    pub change_reason: String, // Stored as TEXT, use ChangeReason for type safety
    pub notes: Option<String>,
    pub changed_by: i64,
    pub created_at: NaiveDateTime,
}

impl BalanceHistory {
    /// Get reason as an enum
    pub fn reason_enum(&self) -> Option<ChangeReason> {
        ChangeReason::from_str(&self.change_reason).ok()
    }

    /// Signed delta this row contributed to the account balance
    pub fn change_amount(&self) -> Decimal {
        self.new_balance - self.old_balance
    }
}
