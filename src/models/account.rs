use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::platform::Platform;

/// Derived account status, recomputed on every balance mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Player has no account on this platform
    Inactive,
    /// Account exists with a zero balance
    Zeroed,
    /// P&L above the banked-in principal
    Profit,
    /// P&L below the banked-in principal
    Loss,
    /// Funded, flat P&L (includes wallet accounts, whose P&L is pinned at 0)
    Active,
}

impl AccountStatus {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "inactive" => Ok(AccountStatus::Inactive),
            "zeroed" => Ok(AccountStatus::Zeroed),
            "profit" => Ok(AccountStatus::Profit),
            "loss" => Ok(AccountStatus::Loss),
            "active" => Ok(AccountStatus::Active),
            _ => Err(format!("Invalid account status: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Inactive => "inactive",
            AccountStatus::Zeroed => "zeroed",
            AccountStatus::Profit => "profit",
            AccountStatus::Loss => "loss",
            AccountStatus::Active => "active",
        }
    }

    /// Status rule applied after every balance mutation
    pub fn derive(has_account: bool, balance: Decimal, pnl: Decimal) -> Self {
        if !has_account {
            AccountStatus::Inactive
        } else if balance == Decimal::ZERO {
            AccountStatus::Zeroed
        } else if pnl > Decimal::ZERO {
            AccountStatus::Profit
        } else if pnl < Decimal::ZERO {
            AccountStatus::Loss
        } else {
            AccountStatus::Active
        }
    }
}

impl From<String> for AccountStatus {
    fn from(s: String) -> Self {
        Self::from_str(&s).unwrap_or(AccountStatus::Inactive)
    }
}

impl From<AccountStatus> for String {
    fn from(status: AccountStatus) -> Self {
        status.as_str().to_string()
    }
}

/// A player's account on one platform. Unique per (user, platform);
/// soft-deactivated rather than deleted. All writes to the financial
/// fields go through the repository transactions, never directly.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub platform_id: i64,
    pub account_name: String,
    /// Banked-in principal the team staked on this platform
    pub initial_balance: Decimal,
    pub current_balance: Decimal,
    pub total_reloads: Decimal,
    pub total_withdrawals: Decimal,
    /// Team's retained half of approved withdrawals; tracked here, not yet
    /// reconciled against team investment anywhere in this crate
    pub team_withdrawal_credits: Decimal,
    /// Admin overrides that supersede the computed figures when present
    pub manual_team_investment: Option<Decimal>,
    pub investment_notes: Option<String>,
    pub manual_reload_amount: Option<Decimal>,
    pub reload_notes: Option<String>,
    pub status: String, // Stored as TEXT, use AccountStatus for type safety
    pub has_account: bool,
    pub last_balance_update: Option<NaiveDateTime>,
    pub balance_verified: bool,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Account {
    /// Profit & loss of this account.
    ///
    /// The wallet platform never contributes: the team deposits there and
    /// the player distributes to the poker sites, so only the sites'
    /// `current - initial` measures play results. Unfunded accounts are 0.
    pub fn pnl(&self, platform: &Platform) -> Decimal {
        if platform.is_wallet() {
            return Decimal::ZERO;
        }
        if !self.has_account {
            return Decimal::ZERO;
        }
        self.current_balance - self.initial_balance
    }

    /// Get status as an enum
    pub fn status_enum(&self) -> AccountStatus {
        AccountStatus::from_str(&self.status).unwrap_or(AccountStatus::Inactive)
    }

    /// Team investment figure, manual override first
    pub fn team_investment(&self) -> Decimal {
        self.manual_team_investment.unwrap_or(self.initial_balance)
    }

    /// Reload total figure, manual override first
    pub fn team_reloads(&self) -> Decimal {
        self.manual_reload_amount.unwrap_or(self.total_reloads)
    }

    /// Whether the balance is stale (no update for more than one day)
    pub fn needs_update(&self, now: NaiveDateTime) -> bool {
        match self.last_balance_update {
            Some(ts) => (now - ts).num_days() > 1,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(initial: Decimal, current: Decimal, has_account: bool) -> Account {
        let now = chrono::Utc::now().naive_utc();
        Account {
            id: 1,
            user_id: 1,
            platform_id: 1,
            account_name: "test".to_string(),
            initial_balance: initial,
            current_balance: current,
            total_reloads: Decimal::ZERO,
            total_withdrawals: Decimal::ZERO,
            team_withdrawal_credits: Decimal::ZERO,
            manual_team_investment: None,
            investment_notes: None,
            manual_reload_amount: None,
            reload_notes: None,
            status: "active".to_string(),
            has_account,
            last_balance_update: Some(now),
            balance_verified: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn platform(name: &str) -> Platform {
        Platform {
            id: 1,
            name: name.to_string(),
            display_name: name.to_string(),
            is_active: true,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_wallet_platform_pnl_is_always_zero() {
        let luxon = platform("Luxon");
        let acc = account(Decimal::new(2000, 2), Decimal::new(50000, 2), true);
        assert_eq!(acc.pnl(&luxon), Decimal::ZERO);
    }

    #[test]
    fn test_poker_site_pnl() {
        let ps = platform("pokerstars");
        let acc = account(Decimal::new(3000, 2), Decimal::new(2500, 2), true);
        assert_eq!(acc.pnl(&ps), Decimal::new(-500, 2));
    }

    #[test]
    fn test_unfunded_account_pnl_is_zero() {
        let ps = platform("pokerstars");
        let acc = account(Decimal::new(3000, 2), Decimal::new(9000, 2), false);
        assert_eq!(acc.pnl(&ps), Decimal::ZERO);
    }

    #[test]
    fn test_status_derivation() {
        let zero = Decimal::ZERO;
        let hundred = Decimal::new(10000, 2);
        assert_eq!(AccountStatus::derive(false, hundred, zero), AccountStatus::Inactive);
        assert_eq!(AccountStatus::derive(true, zero, zero), AccountStatus::Zeroed);
        assert_eq!(
            AccountStatus::derive(true, hundred, Decimal::new(100, 2)),
            AccountStatus::Profit
        );
        assert_eq!(
            AccountStatus::derive(true, hundred, Decimal::new(-100, 2)),
            AccountStatus::Loss
        );
        assert_eq!(AccountStatus::derive(true, hundred, zero), AccountStatus::Active);
    }

    #[test]
    fn test_manual_overrides_supersede_computed() {
        let mut acc = account(Decimal::new(10000, 2), Decimal::new(10000, 2), true);
        assert_eq!(acc.team_investment(), Decimal::new(10000, 2));
        acc.manual_team_investment = Some(Decimal::new(25000, 2));
        assert_eq!(acc.team_investment(), Decimal::new(25000, 2));

        acc.total_reloads = Decimal::new(5000, 2);
        assert_eq!(acc.team_reloads(), Decimal::new(5000, 2));
        acc.manual_reload_amount = Some(Decimal::new(7500, 2));
        assert_eq!(acc.team_reloads(), Decimal::new(7500, 2));
    }
}
