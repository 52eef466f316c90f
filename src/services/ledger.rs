//! Balance mutation engine: the base primitive every other workflow
//! composes on. All writes commit first, events publish after.

use crate::error::{AppError, AppResult};
use crate::events::EventBus;
use crate::models::{Account, ChangeReason};
use crate::repositories::{AccountRepository, PlatformRepository};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

pub struct LedgerService {
    account_repo: Arc<AccountRepository>,
    platform_repo: Arc<PlatformRepository>,
    events: Arc<EventBus>,
}

impl LedgerService {
    pub fn new(
        account_repo: Arc<AccountRepository>,
        platform_repo: Arc<PlatformRepository>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            account_repo,
            platform_repo,
            events,
        }
    }

    /// Apply a new balance to an account.
    ///
    /// Rejects negative balances outright; the account row, its derived
    /// status and the history row commit atomically in the repository.
    pub async fn update_balance(
        &self,
        account_id: i64,
        new_balance: Decimal,
        changed_by: i64,
        reason: ChangeReason,
        notes: Option<&str>,
    ) -> AppResult<Account> {
        if new_balance < Decimal::ZERO {
            return Err(AppError::Validation("Balance cannot be negative".to_string()));
        }

        let account = self
            .account_repo
            .find_by_id(account_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound(format!("Account {} not found", account_id)))?;
        let old_balance = account.current_balance;

        let updated = self
            .account_repo
            .update_balance(account_id, new_balance, changed_by, reason, notes)
            .await
            .map_err(AppError::from)?;

        info!(
            "Balance updated: account={}, {} -> {} ({})",
            account_id,
            old_balance,
            new_balance,
            reason.as_str()
        );

        self.events
            .notify_balance_updated(updated.user_id, updated.id, old_balance, new_balance);
        self.events.notify_dashboard_refresh();

        Ok(updated)
    }

    /// Snapshot all active accounts of a user for today's sheet.
    ///
    /// The close_day rows are no-op markers (old == new); they anchor the
    /// daily time series and drive the calendar tracker.
    pub async fn close_day(&self, user_id: i64, changed_by: i64) -> AppResult<usize> {
        let accounts = self
            .account_repo
            .close_day(user_id, changed_by)
            .await
            .map_err(AppError::from)?;

        info!("Day closed: user={}, accounts={}", user_id, accounts.len());

        self.events.notify_dashboard_refresh();

        Ok(accounts.len())
    }

    /// Create or update a player's account on a platform
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_account(
        &self,
        user_id: i64,
        platform_id: i64,
        account_name: Option<&str>,
        has_account: bool,
        initial_balance: Option<Decimal>,
        current_balance: Option<Decimal>,
        changed_by: i64,
    ) -> AppResult<Account> {
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

        if let Some(balance) = current_balance {
            if balance < Decimal::ZERO {
                return Err(AppError::Validation("Balance cannot be negative".to_string()));
            }
        }

        let account = self
            .account_repo
            .upsert(
                user_id,
                platform_id,
                account_name,
                has_account,
                initial_balance,
                current_balance,
                changed_by,
            )
            .await
            .map_err(AppError::from)?;

        info!(
            "Account upserted: user={}, platform={}, has_account={}",
            user_id, platform_id, has_account
        );

        self.events.notify_dashboard_refresh();

        Ok(account)
    }
}
