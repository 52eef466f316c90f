use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Transaction types for the period-summary log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Reload,
    Withdrawal,
    Profit,
    Loss,
    Adjustment,
}

impl TransactionType {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "reload" => Ok(TransactionType::Reload),
            "withdrawal" => Ok(TransactionType::Withdrawal),
            "profit" => Ok(TransactionType::Profit),
            "loss" => Ok(TransactionType::Loss),
            "adjustment" => Ok(TransactionType::Adjustment),
            _ => Err(format!("Invalid transaction type: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Reload => "reload",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Profit => "profit",
            TransactionType::Loss => "loss",
            TransactionType::Adjustment => "adjustment",
        }
    }
}

impl From<String> for TransactionType {
    fn from(s: String) -> Self {
        Self::from_str(&s).unwrap_or(TransactionType::Adjustment)
    }
}

impl From<TransactionType> for String {
    fn from(tx_type: TransactionType) -> Self {
        tx_type.as_str().to_string()
    }
}

/// Immutable log row created as a side effect of reload approval,
/// withdrawal approval and manual profit/loss entries. Used for period
/// summaries; balance truth stays with BalanceHistory.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub platform_id: i64,
    pub transaction_type: String, // Stored as TEXT, use TransactionType for type safety
    pub amount: Decimal,
    pub description: Option<String>,
    pub reload_request_id: Option<i64>,
    pub created_by: i64,
    pub created_at: NaiveDateTime,
}

impl Transaction {
    /// Get type as an enum
    pub fn type_enum(&self) -> Option<TransactionType> {
        TransactionType::from_str(&self.transaction_type).ok()
    }
}
