use rust_decimal::Decimal;
use stakehouse_backend::error::AppError;
use stakehouse_backend::events::LedgerEvent;
use stakehouse_backend::models::payback::plan_deductions;
use stakehouse_backend::models::withdrawal::split_amount;
use stakehouse_backend::models::*;

fn dollars(units: i64) -> Decimal {
    Decimal::new(units * 100, 2)
}

fn platform(id: i64, name: &str) -> Platform {
    Platform {
        id,
        name: name.to_string(),
        display_name: name.to_string(),
        is_active: true,
        created_at: chrono::Utc::now().naive_utc(),
    }
}

fn account(id: i64, platform_id: i64, initial: Decimal, current: Decimal) -> Account {
    let now = chrono::Utc::now().naive_utc();
    Account {
        id,
        user_id: 1,
        platform_id,
        account_name: format!("account-{}", id),
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
        has_account: true,
        last_balance_update: Some(now),
        balance_verified: true,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// Unit tests for the P&L rule

#[test]
fn test_wallet_platform_is_excluded_from_pnl() {
    let luxon = platform(1, "luxon");
    // Any (initial, current) pair on the wallet platform is P&L zero
    for (initial, current) in [(0i64, 0i64), (20, 20), (100, 5), (0, 500)] {
        let acc = account(1, 1, dollars(initial), dollars(current));
        assert_eq!(acc.pnl(&luxon), Decimal::ZERO);
    }
}

#[test]
fn test_team_distribution_pnl_example() {
    // Luxon $20 -> $20, PokerStars $30 -> $25, GGPoker $50 -> $100
    let luxon = platform(1, "Luxon");
    let pokerstars = platform(2, "pokerstars");
    let ggpoker = platform(3, "ggpoker");

    let wallet = account(1, 1, dollars(20), dollars(20));
    let ps = account(2, 2, dollars(30), dollars(25));
    let gg = account(3, 3, dollars(50), dollars(100));

    assert_eq!(ps.pnl(&pokerstars), dollars(-5));
    assert_eq!(gg.pnl(&ggpoker), dollars(50));
    assert_eq!(wallet.pnl(&luxon), Decimal::ZERO);

    let aggregate = wallet.pnl(&luxon) + ps.pnl(&pokerstars) + gg.pnl(&ggpoker);
    assert_eq!(aggregate, dollars(45));

    let total_balance =
        wallet.current_balance + ps.current_balance + gg.current_balance;
    assert_eq!(total_balance, dollars(145));
}

/// Unit tests for the payback planner

#[test]
fn test_payback_proportional_scenario() {
    // One unpaid $300 reload, balances $200 and $300: deduct $120 and $180
    let balances = vec![(10, dollars(200)), (11, dollars(300))];
    let plan = plan_deductions(&balances, dollars(300));

    assert_eq!(plan.len(), 2);
    assert_eq!(plan[0], (10, dollars(120)));
    assert_eq!(plan[1], (11, dollars(180)));
}

#[test]
fn test_payback_conservation() {
    let cases: Vec<(Vec<(i64, Decimal)>, Decimal)> = vec![
        (vec![(1, dollars(200)), (2, dollars(300))], dollars(300)),
        (
            vec![(1, Decimal::new(777, 2)), (2, Decimal::new(12345, 2)), (3, dollars(50))],
            dollars(100),
        ),
        (vec![(1, dollars(1))], Decimal::new(99, 2)),
    ];

    for (balances, unpaid) in cases {
        let plan = plan_deductions(&balances, unpaid);
        let deducted: Decimal = plan.iter().map(|(_, d)| *d).sum();
        assert_eq!(deducted, unpaid);
        for ((_, d), (_, b)) in plan.iter().zip(balances.iter()) {
            assert!(*d <= *b);
            assert!(*b - *d >= Decimal::ZERO);
        }
    }
}

#[test]
fn test_payback_status_flags_debt() {
    let status = PaybackStatus {
        requests: vec![],
        total_unpaid: dollars(300),
        total_balance: dollars(500),
        can_payback: true,
    };
    assert!(status.has_debt());
    assert!(status.can_payback);

    let settled = PaybackStatus {
        requests: vec![],
        total_unpaid: Decimal::ZERO,
        total_balance: dollars(500),
        can_payback: true,
    };
    assert!(!settled.has_debt());
}

#[test]
fn test_empty_payback_outcome() {
    let outcome = PaybackOutcome::empty(dollars(250));
    assert_eq!(outcome.total_paid_back, Decimal::ZERO);
    assert!(outcome.deductions.is_empty());
    assert!(outcome.reloads_settled.is_empty());
    assert_eq!(outcome.remaining_balance, dollars(250));
}

/// Unit tests for the withdrawal split

#[test]
fn test_withdrawal_split_halves() {
    // Approving $100 debits exactly $50 from the balance; the other $50 is
    // the team's, recorded but not debited
    let (player, team) = split_amount(dollars(100));
    assert_eq!(player, dollars(50));
    assert_eq!(team, dollars(50));
}

#[test]
fn test_withdrawal_split_conserves_total() {
    for cents in [1i64, 5, 99, 12345, 100001] {
        let amount = Decimal::new(cents, 2);
        let (player, team) = split_amount(amount);
        assert_eq!(player + team, amount);
    }
}

/// Unit tests for status derivation

#[test]
fn test_account_status_rule() {
    let balance = dollars(100);
    assert_eq!(
        AccountStatus::derive(false, balance, Decimal::ZERO),
        AccountStatus::Inactive
    );
    assert_eq!(
        AccountStatus::derive(true, Decimal::ZERO, Decimal::ZERO),
        AccountStatus::Zeroed
    );
    assert_eq!(
        AccountStatus::derive(true, balance, dollars(10)),
        AccountStatus::Profit
    );
    assert_eq!(
        AccountStatus::derive(true, balance, dollars(-10)),
        AccountStatus::Loss
    );
    assert_eq!(
        AccountStatus::derive(true, balance, Decimal::ZERO),
        AccountStatus::Active
    );
}

/// Unit tests for enum conversions

#[test]
fn test_reload_status_conversion() {
    assert_eq!(ReloadStatus::Pending.as_str(), "pending");
    assert_eq!(ReloadStatus::Approved.as_str(), "approved");
    assert_eq!(ReloadStatus::Rejected.as_str(), "rejected");
    assert_eq!(ReloadStatus::from_str("approved"), Ok(ReloadStatus::Approved));
    assert!(ReloadStatus::from_str("bogus").is_err());
}

#[test]
fn test_withdrawal_status_conversion() {
    assert_eq!(WithdrawalStatus::Pending.as_str(), "pending");
    assert_eq!(WithdrawalStatus::Completed.as_str(), "completed");
    assert_eq!(
        WithdrawalStatus::from_str("completed"),
        Ok(WithdrawalStatus::Completed)
    );
    assert!(WithdrawalStatus::from_str("done").is_err());
}

#[test]
fn test_transaction_type_conversion() {
    assert_eq!(TransactionType::Reload.as_str(), "reload");
    assert_eq!(TransactionType::Withdrawal.as_str(), "withdrawal");
    assert_eq!(TransactionType::Profit.as_str(), "profit");
    assert_eq!(TransactionType::Loss.as_str(), "loss");
    assert_eq!(TransactionType::Adjustment.as_str(), "adjustment");
}

#[test]
fn test_change_reason_conversion() {
    for reason in [
        ChangeReason::ManualUpdate,
        ChangeReason::ReloadApproved,
        ChangeReason::WithdrawalApproved,
        ChangeReason::ReloadPayback,
        ChangeReason::CloseDay,
        ChangeReason::AccountStatusChange,
        ChangeReason::InitialState,
    ] {
        assert_eq!(ChangeReason::from_str(reason.as_str()), Ok(reason));
    }
    assert!(ChangeReason::from_str("reload").is_err());
}

#[test]
fn test_user_role_conversion() {
    assert_eq!(UserRole::Manager.as_str(), "manager");
    assert!(UserRole::Admin.is_staff());
    assert!(UserRole::Manager.is_staff());
    assert!(!UserRole::Player.is_staff());
}

/// Unit tests for request state helpers

#[test]
fn test_reload_outstanding_flag() {
    let now = chrono::Utc::now().naive_utc();
    let mut reload = ReloadRequest {
        id: 1,
        user_id: 1,
        platform_id: 1,
        amount: dollars(500),
        status: "pending".to_string(),
        paid_back: false,
        paid_back_at: None,
        player_notes: None,
        manager_notes: None,
        approved_by: None,
        approved_at: None,
        created_at: now,
        updated_at: now,
    };

    assert!(reload.is_pending());
    assert!(!reload.is_outstanding());

    reload.status = "approved".to_string();
    assert!(reload.is_outstanding());

    reload.paid_back = true;
    assert!(!reload.is_outstanding());
}

#[test]
fn test_history_change_amount() {
    let row = BalanceHistory {
        id: 1,
        account_id: 1,
        old_balance: dollars(200),
        new_balance: dollars(80),
        change_reason: "reload_payback".to_string(),
        notes: None,
        changed_by: 1,
        created_at: chrono::Utc::now().naive_utc(),
    };
    assert_eq!(row.change_amount(), dollars(-120));
    assert_eq!(row.reason_enum(), Some(ChangeReason::ReloadPayback));
}

/// Unit tests for error shapes

#[test]
fn test_outstanding_debt_error_carries_detail() {
    let err = AppError::OutstandingReloadDebt {
        unpaid_amount: dollars(300),
        can_auto_payback: true,
    };
    assert_eq!(err.status_code(), 400);
    assert!(format!("{}", err).contains("300"));

    if let AppError::OutstandingReloadDebt {
        unpaid_amount,
        can_auto_payback,
    } = err
    {
        assert_eq!(unpaid_amount, dollars(300));
        assert!(can_auto_payback);
    } else {
        panic!("wrong variant");
    }
}

#[test]
fn test_insufficient_balance_error_reports_both_figures() {
    let err = AppError::InsufficientBalance {
        available: dollars(100),
        required: dollars(300),
    };
    let message = format!("{}", err);
    assert!(message.contains("100"));
    assert!(message.contains("300"));
}

#[test]
fn test_not_pending_error() {
    let err = AppError::NotPending {
        status: "approved".to_string(),
    };
    assert_eq!(err.status_code(), 409);
    assert!(format!("{}", err).contains("approved"));
}

/// Unit tests for event serialization

#[test]
fn test_ledger_event_serialization() {
    let event = LedgerEvent::BalanceUpdated {
        user_id: 7,
        account_id: 3,
        old_balance: dollars(200),
        new_balance: dollars(80),
    };
    let json = serde_json::to_value(&event).expect("event serializes");
    assert_eq!(json["type"], "balance_updated");
    assert_eq!(json["user_id"], 7);
    // Decimals serialize as strings so amounts round-trip without drift
    assert_eq!(json["new_balance"], "80.00");

    let refresh = serde_json::to_value(LedgerEvent::DashboardRefresh).expect("event serializes");
    assert_eq!(refresh["type"], "dashboard_refresh");
}

#[test]
fn test_account_amounts_serialize_as_strings() {
    let acc = account(1, 1, dollars(30), dollars(25));
    let json = serde_json::to_value(&acc).expect("account serializes");
    assert_eq!(json["current_balance"], "25.00");
    assert_eq!(json["initial_balance"], "30.00");
}
