//! Reload payback: proportional settlement of the team's outstanding
//! advances against a player's funded balances.

use crate::error::{AppError, AppResult};
use crate::events::{EventBus, LedgerEvent};
use crate::models::{PaybackOutcome, PaybackStatus};
use crate::repositories::{AccountRepository, ReloadRepository};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

pub struct PaybackService {
    reload_repo: Arc<ReloadRepository>,
    account_repo: Arc<AccountRepository>,
    events: Arc<EventBus>,
}

impl PaybackService {
    pub fn new(
        reload_repo: Arc<ReloadRepository>,
        account_repo: Arc<AccountRepository>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            reload_repo,
            account_repo,
            events,
        }
    }

    /// Outstanding-debt snapshot: which reloads are unpaid, what the funded
    /// balances add up to, and whether they cover the debt. Withdrawal
    /// creation consults this gate.
    pub async fn unpaid_status(&self, user_id: i64) -> AppResult<PaybackStatus> {
        let requests = self
            .reload_repo
            .unpaid_for_user(user_id)
            .await
            .map_err(AppError::from)?;

        let accounts = self
            .account_repo
            .list_funded_for_user(user_id)
            .await
            .map_err(AppError::from)?;

        let total_unpaid: Decimal = requests.iter().map(|r| r.amount).sum();
        let total_balance: Decimal = accounts.iter().map(|a| a.current_balance).sum();

        Ok(PaybackStatus {
            requests,
            total_unpaid,
            total_balance,
            can_payback: total_balance >= total_unpaid,
        })
    }

    /// Settle all of a user's unpaid reloads.
    ///
    /// A user with nothing outstanding gets an empty outcome. Insufficient
    /// total balance is a hard error reporting both figures; nothing is
    /// deducted. Otherwise the repository commits every deduction, history
    /// row and paid_back flag in one transaction.
    pub async fn payback(&self, user_id: i64, changed_by: i64) -> AppResult<PaybackOutcome> {
        let outcome = self
            .reload_repo
            .settle_payback(user_id, changed_by)
            .await
            .map_err(AppError::from)?;

        if outcome.reloads_settled.is_empty() {
            info!("Payback: user={} has no outstanding reloads", user_id);
            return Ok(outcome);
        }

        info!(
            "Reloads paid back: user={}, total={}, reloads={}, accounts={}",
            user_id,
            outcome.total_paid_back,
            outcome.reloads_settled.len(),
            outcome.deductions.len()
        );

        for deduction in &outcome.deductions {
            self.events.notify_balance_updated(
                user_id,
                deduction.account_id,
                deduction.old_balance,
                deduction.new_balance,
            );
        }
        self.events.publish(LedgerEvent::ReloadsPaidBack {
            user_id,
            total_paid_back: outcome.total_paid_back,
        });
        self.events.notify_dashboard_refresh();

        Ok(outcome)
    }
}
