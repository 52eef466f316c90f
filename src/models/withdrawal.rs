use chrono::NaiveDateTime;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Withdrawal request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl WithdrawalStatus {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(WithdrawalStatus::Pending),
            "approved" => Ok(WithdrawalStatus::Approved),
            "rejected" => Ok(WithdrawalStatus::Rejected),
            "completed" => Ok(WithdrawalStatus::Completed),
            _ => Err(format!("Invalid withdrawal status: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Rejected => "rejected",
            WithdrawalStatus::Completed => "completed",
        }
    }
}

impl From<String> for WithdrawalStatus {
    fn from(s: String) -> Self {
        Self::from_str(&s).unwrap_or(WithdrawalStatus::Pending)
    }
}

impl From<WithdrawalStatus> for String {
    fn from(status: WithdrawalStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Split a withdrawal amount between player and team.
///
/// Half the proceeds are debited from the player's platform balance; the
/// other half stays on the site and accrues to the team's withdrawal
/// credits. The player portion is rounded to cents (midpoint away from
/// zero) and the team takes the remainder, so the parts always sum to the
/// full amount.
pub fn split_amount(amount: Decimal) -> (Decimal, Decimal) {
    let player = (amount / Decimal::new(2, 0))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let team = amount - player;
    (player, team)
}

/// A request to withdraw from a platform balance. pending -> approved ->
/// completed, or pending -> rejected; the balance effect happens at
/// approval, completion only marks the transfer as settled.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WithdrawalRequest {
    pub id: i64,
    pub user_id: i64,
    pub platform_id: i64,
    pub amount: Decimal,
    pub status: String, // Stored as TEXT, use WithdrawalStatus for type safety
    pub player_notes: Option<String>,
    pub manager_notes: Option<String>,
    pub approved_by: Option<i64>,
    pub approved_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl WithdrawalRequest {
    /// Get status as an enum
    pub fn status_enum(&self) -> WithdrawalStatus {
        WithdrawalStatus::from_str(&self.status).unwrap_or(WithdrawalStatus::Pending)
    }

    pub fn is_pending(&self) -> bool {
        self.status_enum() == WithdrawalStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_amount_splits_in_half() {
        let (player, team) = split_amount(Decimal::new(10000, 2)); // $100.00
        assert_eq!(player, Decimal::new(5000, 2));
        assert_eq!(team, Decimal::new(5000, 2));
    }

    #[test]
    fn test_odd_cent_goes_to_player() {
        let (player, team) = split_amount(Decimal::new(5, 2)); // $0.05
        assert_eq!(player, Decimal::new(3, 2));
        assert_eq!(team, Decimal::new(2, 2));
    }

    #[test]
    fn test_split_always_conserves_amount() {
        for cents in [1i64, 33, 99, 1001, 123_456] {
            let amount = Decimal::new(cents, 2);
            let (player, team) = split_amount(amount);
            assert_eq!(player + team, amount);
        }
    }
}
