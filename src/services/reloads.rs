//! Reload request workflow: pending -> approved | rejected.
//!
//! Approval credits the player's platform account and leaves the reload as
//! outstanding team debt until the payback engine settles it.

use crate::error::{AppError, AppResult};
use crate::events::EventBus;
use crate::models::{ReloadRequest, ReloadStatus};
use crate::repositories::{PlatformRepository, ReloadRepository};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

pub struct ReloadService {
    reload_repo: Arc<ReloadRepository>,
    platform_repo: Arc<PlatformRepository>,
    events: Arc<EventBus>,
}

impl ReloadService {
    pub fn new(
        reload_repo: Arc<ReloadRepository>,
        platform_repo: Arc<PlatformRepository>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            reload_repo,
            platform_repo,
            events,
        }
    }

    /// Create a pending reload request
    pub async fn create(
        &self,
        user_id: i64,
        platform_id: i64,
        amount: Decimal,
        player_notes: Option<&str>,
    ) -> AppResult<ReloadRequest> {
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

        let request = self
            .reload_repo
            .create(user_id, platform_id, amount, player_notes)
            .await
            .map_err(AppError::from)?;

        info!(
            "Reload requested: id={}, user={}, platform={}, amount={}",
            request.id, user_id, platform_id, amount
        );

        self.events
            .notify_reload_status(request.id, user_id, ReloadStatus::Pending.as_str());

        Ok(request)
    }

    /// Approve a pending reload.
    ///
    /// A request that already left pending fails with no state change, so a
    /// double approval cannot credit twice.
    pub async fn approve(
        &self,
        reload_id: i64,
        manager_id: i64,
        notes: Option<&str>,
    ) -> AppResult<ReloadRequest> {
        let (request, account) = self
            .reload_repo
            .approve(reload_id, manager_id, notes)
            .await
            .map_err(AppError::from)?;

        info!(
            "Reload approved: id={}, user={}, amount={}, by={}",
            request.id, request.user_id, request.amount, manager_id
        );

        self.events
            .notify_reload_status(request.id, request.user_id, ReloadStatus::Approved.as_str());
        if let Some(account) = account {
            self.events.notify_balance_updated(
                account.user_id,
                account.id,
                account.current_balance - request.amount,
                account.current_balance,
            );
        }
        self.events.notify_dashboard_refresh();

        Ok(request)
    }

    /// Reject a pending reload. Manager notes are mandatory so the player
    /// learns why.
    pub async fn reject(
        &self,
        reload_id: i64,
        manager_id: i64,
        notes: &str,
    ) -> AppResult<ReloadRequest> {
        if notes.trim().is_empty() {
            return Err(AppError::Validation(
                "Manager notes are required for rejection".to_string(),
            ));
        }

        let request = self
            .reload_repo
            .reject(reload_id, manager_id, notes)
            .await
            .map_err(AppError::from)?;

        info!(
            "Reload rejected: id={}, user={}, by={}",
            request.id, request.user_id, manager_id
        );

        self.events
            .notify_reload_status(request.id, request.user_id, ReloadStatus::Rejected.as_str());

        Ok(request)
    }
}
