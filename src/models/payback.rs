//! Proportional settlement of outstanding reload debt.
//!
//! Approved reloads are money the team advanced; the principal must come
//! back out of the player's balances before a withdrawal can be created.
//! The planner here is pure so the settlement math is testable on its own;
//! the repository applies a plan inside a single transaction.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::reload::ReloadRequest;

/// Outstanding-debt snapshot for a user, as reported to the caller before
/// (or instead of) running a payback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaybackStatus {
    pub requests: Vec<ReloadRequest>,
    pub total_unpaid: Decimal,
    /// Sum of current balances over the user's active, funded accounts
    pub total_balance: Decimal,
    /// Whether the balances cover the debt
    pub can_payback: bool,
}

impl PaybackStatus {
    pub fn has_debt(&self) -> bool {
        self.total_unpaid > Decimal::ZERO
    }
}

/// One account's share of a settled payback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountDeduction {
    pub account_id: i64,
    pub platform_name: String,
    pub amount_deducted: Decimal,
    pub old_balance: Decimal,
    pub new_balance: Decimal,
}

/// Result of a payback run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaybackOutcome {
    pub total_paid_back: Decimal,
    pub deductions: Vec<AccountDeduction>,
    pub reloads_settled: Vec<i64>,
    pub remaining_balance: Decimal,
}

impl PaybackOutcome {
    /// Outcome of a payback with nothing outstanding
    pub fn empty(total_balance: Decimal) -> Self {
        Self {
            total_paid_back: Decimal::ZERO,
            deductions: Vec::new(),
            reloads_settled: Vec::new(),
            remaining_balance: total_balance,
        }
    }
}

/// Plan the per-account deductions that settle `total_unpaid` against the
/// given `(account_id, balance)` pairs.
///
/// Each positive-balance account pays its proportional share
/// `balance / total_balance * total_unpaid`, rounded to cents (midpoint
/// away from zero). The last positive-balance account absorbs the residual
/// cents instead of a rounded share, clamped to its balance, so the plan
/// sums to `total_unpaid` exactly whenever the balances cover the debt.
///
/// The caller is responsible for checking `total_balance >= total_unpaid`
/// first; with an insufficient total the plan simply drains every balance.
pub fn plan_deductions(balances: &[(i64, Decimal)], total_unpaid: Decimal) -> Vec<(i64, Decimal)> {
    let total_balance: Decimal = balances.iter().map(|(_, b)| *b).sum();
    let mut plan = Vec::new();
    if total_unpaid <= Decimal::ZERO || total_balance <= Decimal::ZERO {
        return plan;
    }

    let positive: Vec<&(i64, Decimal)> =
        balances.iter().filter(|(_, b)| *b > Decimal::ZERO).collect();
    let mut remaining = total_unpaid;

    for (idx, (account_id, balance)) in positive.iter().enumerate() {
        if remaining <= Decimal::ZERO {
            break;
        }
        let deduction = if idx == positive.len() - 1 {
            // last account takes whatever is left
            remaining.min(*balance)
        } else {
            let share = (*balance / total_balance * total_unpaid)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            remaining.min(share).min(*balance)
        };
        if deduction > Decimal::ZERO {
            plan.push((*account_id, deduction));
            remaining -= deduction;
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(plan: &[(i64, Decimal)]) -> Decimal {
        plan.iter().map(|(_, d)| *d).sum()
    }

    #[test]
    fn test_proportional_two_account_split() {
        // $300 debt against $200 + $300 balances: 200/500 and 300/500 shares
        let balances = vec![(1, Decimal::new(20000, 2)), (2, Decimal::new(30000, 2))];
        let plan = plan_deductions(&balances, Decimal::new(30000, 2));
        assert_eq!(plan, vec![
            (1, Decimal::new(12000, 2)),
            (2, Decimal::new(18000, 2)),
        ]);
    }

    #[test]
    fn test_plan_conserves_total_unpaid() {
        let balances = vec![
            (1, Decimal::new(3333, 2)),
            (2, Decimal::new(6667, 2)),
            (3, Decimal::new(10101, 2)),
        ];
        let unpaid = Decimal::new(10000, 2);
        let plan = plan_deductions(&balances, unpaid);
        assert_eq!(total(&plan), unpaid);
    }

    #[test]
    fn test_last_account_absorbs_residual_cents() {
        // Equal thirds of $1.00 round to $0.33 each; the last takes $0.34
        let balances = vec![
            (1, Decimal::new(1000, 2)),
            (2, Decimal::new(1000, 2)),
            (3, Decimal::new(1000, 2)),
        ];
        let plan = plan_deductions(&balances, Decimal::new(100, 2));
        assert_eq!(plan[0].1, Decimal::new(33, 2));
        assert_eq!(plan[1].1, Decimal::new(33, 2));
        assert_eq!(plan[2].1, Decimal::new(34, 2));
    }

    #[test]
    fn test_zero_balance_accounts_are_skipped() {
        let balances = vec![
            (1, Decimal::ZERO),
            (2, Decimal::new(50000, 2)),
        ];
        let plan = plan_deductions(&balances, Decimal::new(10000, 2));
        assert_eq!(plan, vec![(2, Decimal::new(10000, 2))]);
    }

    #[test]
    fn test_no_debt_yields_empty_plan() {
        let balances = vec![(1, Decimal::new(10000, 2))];
        assert!(plan_deductions(&balances, Decimal::ZERO).is_empty());
    }

    #[test]
    fn test_deductions_never_exceed_balances() {
        let balances = vec![
            (1, Decimal::new(100, 2)),
            (2, Decimal::new(9900, 2)),
        ];
        let plan = plan_deductions(&balances, Decimal::new(10000, 2));
        for ((_, deducted), (_, balance)) in plan.iter().zip(balances.iter()) {
            assert!(deducted <= balance);
        }
        assert_eq!(total(&plan), Decimal::new(10000, 2));
    }
}
