//! Manual transaction log entries (profit, loss, adjustment).
//!
//! Reload and withdrawal transactions are written by their workflows; this
//! service only covers the manually entered types that feed the period
//! summaries.

use crate::error::{AppError, AppResult};
use crate::models::{Transaction, TransactionType};
use crate::repositories::{PlatformRepository, TransactionRepository};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

pub struct TransactionService {
    transaction_repo: Arc<TransactionRepository>,
    platform_repo: Arc<PlatformRepository>,
}

impl TransactionService {
    pub fn new(
        transaction_repo: Arc<TransactionRepository>,
        platform_repo: Arc<PlatformRepository>,
    ) -> Self {
        Self {
            transaction_repo,
            platform_repo,
        }
    }

    /// Record a manual profit/loss/adjustment entry
    pub async fn record(
        &self,
        user_id: i64,
        platform_id: i64,
        tx_type: TransactionType,
        amount: Decimal,
        description: Option<&str>,
        created_by: i64,
    ) -> AppResult<Transaction> {
        if amount <= Decimal::ZERO {
            return Err(AppError::Validation("Amount must be positive".to_string()));
        }

        if matches!(tx_type, TransactionType::Reload | TransactionType::Withdrawal) {
            return Err(AppError::Validation(
                "Reload and withdrawal transactions are recorded by their workflows".to_string(),
            ));
        }

        let platform = self
            .platform_repo
            .find_by_id(platform_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound(format!("Platform {} not found", platform_id)))?;

        if !platform.is_active {
            return Err(AppError::Validation(format!(
                "Platform {} is inactive",
                platform.display_name
            )));
        }

        let transaction = self
            .transaction_repo
            .create(user_id, platform_id, tx_type, amount, description, None, created_by)
            .await
            .map_err(AppError::from)?;

        info!(
            "Transaction recorded: id={}, user={}, type={}, amount={}",
            transaction.id,
            user_id,
            tx_type.as_str(),
            amount
        );

        Ok(transaction)
    }
}
