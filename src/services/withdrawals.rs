//! Withdrawal workflow: pending -> approved -> completed, or rejected.
//!
//! Creation is gated on reload debt: a player with any unpaid approved
//! reload must run the payback engine first. Approval applies the 50/50
//! split and re-checks the balance, since time may have passed since the
//! request was created.

use crate::error::{AppError, AppResult};
use crate::events::EventBus;
use crate::models::{WithdrawalRequest, WithdrawalStatus};
use crate::repositories::{AccountRepository, PlatformRepository, ReloadRepository, WithdrawalRepository};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

pub struct WithdrawalService {
    withdrawal_repo: Arc<WithdrawalRepository>,
    reload_repo: Arc<ReloadRepository>,
    account_repo: Arc<AccountRepository>,
    platform_repo: Arc<PlatformRepository>,
    events: Arc<EventBus>,
}

impl WithdrawalService {
    pub fn new(
        withdrawal_repo: Arc<WithdrawalRepository>,
        reload_repo: Arc<ReloadRepository>,
        account_repo: Arc<AccountRepository>,
        platform_repo: Arc<PlatformRepository>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            withdrawal_repo,
            reload_repo,
            account_repo,
            platform_repo,
            events,
        }
    }

    /// Create a pending withdrawal request.
    ///
    /// Fails with a structured error when the user carries unpaid reload
    /// debt, regardless of available balance; the caller is expected to run
    /// the payback flow first (`can_auto_payback` says whether it would
    /// succeed right now).
    pub async fn create(
        &self,
        user_id: i64,
        platform_id: i64,
        amount: Decimal,
        player_notes: Option<&str>,
    ) -> AppResult<WithdrawalRequest> {
        if amount <= Decimal::ZERO {
            return Err(AppError::Validation(
                "Amount must be greater than zero".to_string(),
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

        let account = self
            .account_repo
            .find_by_user_platform(user_id, platform_id)
            .await
            .map_err(AppError::from)?
            .filter(|a| a.is_active && a.has_account)
            .ok_or_else(|| {
                AppError::BusinessLogic(
                    "User does not have an active account on this platform".to_string(),
                )
            })?;

        if amount > account.current_balance {
            return Err(AppError::InsufficientBalance {
                available: account.current_balance,
                required: amount,
            });
        }

        // Reload debt gate
        let unpaid = self
            .reload_repo
            .unpaid_for_user(user_id)
            .await
            .map_err(AppError::from)?;
        if !unpaid.is_empty() {
            let unpaid_amount: Decimal = unpaid.iter().map(|r| r.amount).sum();
            let funded = self
                .account_repo
                .list_funded_for_user(user_id)
                .await
                .map_err(AppError::from)?;
            let total_balance: Decimal = funded.iter().map(|a| a.current_balance).sum();

            return Err(AppError::OutstandingReloadDebt {
                unpaid_amount,
                can_auto_payback: total_balance >= unpaid_amount,
            });
        }

        let request = self
            .withdrawal_repo
            .create(user_id, platform_id, amount, player_notes)
            .await
            .map_err(AppError::from)?;

        info!(
            "Withdrawal requested: id={}, user={}, platform={}, amount={}",
            request.id, user_id, platform_id, amount
        );

        self.events.notify_withdrawal_status(
            request.id,
            user_id,
            WithdrawalStatus::Pending.as_str(),
        );

        Ok(request)
    }

    /// Approve a pending withdrawal, applying the 50/50 settlement rule.
    pub async fn approve(
        &self,
        withdrawal_id: i64,
        manager_id: i64,
        notes: Option<&str>,
    ) -> AppResult<WithdrawalRequest> {
        let (request, account) = self
            .withdrawal_repo
            .approve(withdrawal_id, manager_id, notes)
            .await
            .map_err(AppError::from)?;

        info!(
            "Withdrawal approved: id={}, user={}, amount={}, by={}",
            request.id, request.user_id, request.amount, manager_id
        );

        self.events
            .notify_withdrawal_status(request.id, request.user_id, WithdrawalStatus::Approved.as_str());
        self.events.notify_balance_updated(
            account.user_id,
            account.id,
            account.current_balance + crate::models::withdrawal::split_amount(request.amount).0,
            account.current_balance,
        );
        self.events.notify_dashboard_refresh();

        Ok(request)
    }

    /// Reject a pending withdrawal. Manager notes are mandatory.
    pub async fn reject(
        &self,
        withdrawal_id: i64,
        manager_id: i64,
        notes: &str,
    ) -> AppResult<WithdrawalRequest> {
        if notes.trim().is_empty() {
            return Err(AppError::Validation(
                "Manager notes are required for rejection".to_string(),
            ));
        }

        let request = self
            .withdrawal_repo
            .reject(withdrawal_id, manager_id, notes)
            .await
            .map_err(AppError::from)?;

        info!(
            "Withdrawal rejected: id={}, user={}, by={}",
            request.id, request.user_id, manager_id
        );

        self.events
            .notify_withdrawal_status(request.id, request.user_id, WithdrawalStatus::Rejected.as_str());

        Ok(request)
    }

    /// Mark an approved withdrawal as completed (the transfer settled)
    pub async fn complete(
        &self,
        withdrawal_id: i64,
        notes: Option<&str>,
    ) -> AppResult<WithdrawalRequest> {
        let request = self
            .withdrawal_repo
            .complete(withdrawal_id, notes)
            .await
            .map_err(AppError::from)?;

        info!("Withdrawal completed: id={}, user={}", request.id, request.user_id);

        self.events
            .notify_withdrawal_status(request.id, request.user_id, WithdrawalStatus::Completed.as_str());

        Ok(request)
    }
}
