//! Read-only aggregation over accounts, the transaction log and the
//! balance history. Time-series views derive from balance_history deltas,
//! never from live balances, so historical reports stay stable.

use crate::error::{AppError, AppResult};
use crate::models::{ChangeReason, Platform, TransactionType};
use crate::repositories::{
    AccountRepository, HistoryRepository, PlatformRepository, TransactionRepository, UserRepository,
};
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// One day of the team P&L series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PnlPoint {
    pub date: NaiveDate,
    pub delta: Decimal,
    pub cumulative: Decimal,
}

/// One day of the calendar tracker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub filled: bool,
}

/// Per-type transaction totals over a window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub total_reloads: Decimal,
    pub total_withdrawals: Decimal,
    pub total_profits: Decimal,
    pub total_losses: Decimal,
    pub net_result: Decimal,
    /// Sum of close_day deltas in the window, aligned with the P&L chart
    pub chart_aligned_profit: Decimal,
}

/// One player's row in the team overview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerOverview {
    pub user_id: i64,
    pub full_name: String,
    pub total_balance: Decimal,
    pub pnl: Decimal,
    pub account_count: usize,
}

/// Live team snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamOverview {
    pub total_balance: Decimal,
    pub total_pnl: Decimal,
    pub players: Vec<PlayerOverview>,
}

pub struct ReportingService {
    account_repo: Arc<AccountRepository>,
    platform_repo: Arc<PlatformRepository>,
    history_repo: Arc<HistoryRepository>,
    transaction_repo: Arc<TransactionRepository>,
    user_repo: Arc<UserRepository>,
}

impl ReportingService {
    pub fn new(
        account_repo: Arc<AccountRepository>,
        platform_repo: Arc<PlatformRepository>,
        history_repo: Arc<HistoryRepository>,
        transaction_repo: Arc<TransactionRepository>,
        user_repo: Arc<UserRepository>,
    ) -> Self {
        Self {
            account_repo,
            platform_repo,
            history_repo,
            transaction_repo,
            user_repo,
        }
    }

    /// Platforms keyed by id, for the pure per-account P&L rule
    async fn platform_map(&self) -> AppResult<HashMap<i64, Platform>> {
        let platforms = self.platform_repo.list_all().await.map_err(AppError::from)?;
        Ok(platforms.into_iter().map(|p| (p.id, p)).collect())
    }

    /// Aggregate P&L for one user: sum of the pure per-account figure, with
    /// wallet accounts contributing zero
    pub async fn aggregate_pnl(&self, user_id: i64) -> AppResult<Decimal> {
        let platforms = self.platform_map().await?;
        let accounts = self
            .account_repo
            .list_for_user(user_id)
            .await
            .map_err(AppError::from)?;

        let pnl = accounts
            .iter()
            .filter_map(|a| platforms.get(&a.platform_id).map(|p| a.pnl(p)))
            .sum();

        Ok(pnl)
    }

    /// Daily team P&L series over the trailing window.
    ///
    /// Sums every balance_history delta per day; the cumulative line is
    /// seeded from the sum of all deltas before the window.
    pub async fn team_pnl_series(&self, days: i64) -> AppResult<Vec<PnlPoint>> {
        let (start, end) = trailing_window(days);

        let baseline = self
            .history_repo
            .sum_deltas_before(start)
            .await
            .map_err(AppError::from)?;
        let daily = self
            .history_repo
            .daily_deltas(start, end)
            .await
            .map_err(AppError::from)?;

        let delta_by_day: HashMap<NaiveDate, Decimal> = daily.into_iter().collect();

        let mut series = Vec::with_capacity(days as usize);
        let mut cumulative = baseline;
        let mut cursor = start.date();
        while cursor <= end.date() {
            let delta = delta_by_day.get(&cursor).copied().unwrap_or(Decimal::ZERO);
            cumulative += delta;
            series.push(PnlPoint {
                date: cursor,
                delta,
                cumulative,
            });
            cursor += Duration::days(1);
        }

        Ok(series)
    }

    /// The last `days` days with a filled/not-filled flag per day. A day is
    /// filled iff at least one close_day row exists for any of the user's
    /// active accounts on that date.
    pub async fn calendar_tracker(&self, user_id: i64, days: i64) -> AppResult<Vec<CalendarDay>> {
        let (start, end) = trailing_window(days);

        let filled_dates: Vec<NaiveDate> = self
            .history_repo
            .close_day_dates(user_id, start, end)
            .await
            .map_err(AppError::from)?;

        let mut calendar = Vec::with_capacity(days as usize);
        let mut cursor = start.date();
        while cursor <= end.date() {
            calendar.push(CalendarDay {
                date: cursor,
                filled: filled_dates.contains(&cursor),
            });
            cursor += Duration::days(1);
        }

        Ok(calendar)
    }

    /// Per-type transaction totals over the trailing window, plus the
    /// chart-aligned profit figure
    pub async fn financial_summary(&self, days: i64) -> AppResult<FinancialSummary> {
        let (start, end) = trailing_window(days);

        let sums = self
            .transaction_repo
            .sums_by_type(start, end)
            .await
            .map_err(AppError::from)?;

        let mut summary = FinancialSummary {
            total_reloads: Decimal::ZERO,
            total_withdrawals: Decimal::ZERO,
            total_profits: Decimal::ZERO,
            total_losses: Decimal::ZERO,
            net_result: Decimal::ZERO,
            chart_aligned_profit: Decimal::ZERO,
        };

        for (tx_type, amount) in sums {
            match TransactionType::from_str(&tx_type) {
                Ok(TransactionType::Reload) => summary.total_reloads = amount,
                Ok(TransactionType::Withdrawal) => summary.total_withdrawals = amount,
                Ok(TransactionType::Profit) => summary.total_profits = amount,
                Ok(TransactionType::Loss) => summary.total_losses = amount,
                _ => {}
            }
        }
        summary.net_result = summary.total_profits - summary.total_losses;

        summary.chart_aligned_profit = self
            .history_repo
            .sum_deltas(start, end, Some(ChangeReason::CloseDay))
            .await
            .map_err(AppError::from)?;

        Ok(summary)
    }

    /// Live snapshot of every active player's balance and P&L
    pub async fn team_overview(&self) -> AppResult<TeamOverview> {
        let platforms = self.platform_map().await?;
        let players = self
            .user_repo
            .list_active_players()
            .await
            .map_err(AppError::from)?;
        let accounts = self.account_repo.list_active().await.map_err(AppError::from)?;

        let mut overview = TeamOverview {
            total_balance: Decimal::ZERO,
            total_pnl: Decimal::ZERO,
            players: Vec::with_capacity(players.len()),
        };

        for player in players {
            let player_accounts: Vec<_> =
                accounts.iter().filter(|a| a.user_id == player.id).collect();
            let total_balance: Decimal =
                player_accounts.iter().map(|a| a.current_balance).sum();
            let pnl: Decimal = player_accounts
                .iter()
                .filter_map(|a| platforms.get(&a.platform_id).map(|p| a.pnl(p)))
                .sum();

            overview.total_balance += total_balance;
            overview.total_pnl += pnl;
            overview.players.push(PlayerOverview {
                user_id: player.id,
                full_name: player.full_name,
                total_balance,
                pnl,
                account_count: player_accounts.len(),
            });
        }

        Ok(overview)
    }
}

/// End of today back through `days` days inclusive
fn trailing_window(days: i64) -> (NaiveDateTime, NaiveDateTime) {
    let now = Utc::now().naive_utc();
    let end = now.date().and_hms_opt(23, 59, 59).unwrap_or(now);
    let start_date = end.date() - Duration::days(days.max(1) - 1);
    let start = start_date.and_hms_opt(0, 0, 0).unwrap_or(end);
    (start, end)
}
