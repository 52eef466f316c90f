//! Repository for account state and the balance mutation engine.
//!
//! Every mutation here runs in a single transaction that locks the account
//! row, writes the new state and appends the matching balance_history row.
//! No other code path writes the financial columns.

use crate::error::RepositoryError;
use crate::models::{Account, AccountStatus, ChangeReason, Platform};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::PgPool;

const ACCOUNT_COLUMNS: &str = r#"
    id, user_id, platform_id, account_name, initial_balance, current_balance,
    total_reloads, total_withdrawals, team_withdrawal_credits,
    manual_team_investment, investment_notes, manual_reload_amount, reload_notes,
    status, has_account, last_balance_update, balance_verified, is_active,
    created_at, updated_at
"#;

pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Find an account by id
    pub async fn find_by_id(&self, account_id: i64) -> Result<Option<Account>, RepositoryError> {
        let sql = format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS);
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Find the unique account for a (user, platform) pair
    pub async fn find_by_user_platform(
        &self,
        user_id: i64,
        platform_id: i64,
    ) -> Result<Option<Account>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM accounts WHERE user_id = $1 AND platform_id = $2",
            ACCOUNT_COLUMNS
        );
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(user_id)
            .bind(platform_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// List a user's active accounts
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<Account>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM accounts WHERE user_id = $1 AND is_active = TRUE ORDER BY id",
            ACCOUNT_COLUMNS
        );
        let accounts = sqlx::query_as::<_, Account>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(accounts)
    }

    /// List a user's active, funded accounts (the ones payback draws from)
    pub async fn list_funded_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<Account>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM accounts WHERE user_id = $1 AND is_active = TRUE AND has_account = TRUE ORDER BY id",
            ACCOUNT_COLUMNS
        );
        let accounts = sqlx::query_as::<_, Account>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(accounts)
    }

    /// List every active account across the team
    pub async fn list_active(&self) -> Result<Vec<Account>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM accounts WHERE is_active = TRUE ORDER BY user_id, id",
            ACCOUNT_COLUMNS
        );
        let accounts = sqlx::query_as::<_, Account>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(accounts)
    }

    /// List funded accounts whose balance has not been updated since `cutoff`
    pub async fn list_stale(
        &self,
        cutoff: NaiveDateTime,
    ) -> Result<Vec<Account>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {} FROM accounts
            WHERE is_active = TRUE AND has_account = TRUE
              AND (last_balance_update IS NULL OR last_balance_update < $1)
            ORDER BY user_id, id
            "#,
            ACCOUNT_COLUMNS
        );
        let accounts = sqlx::query_as::<_, Account>(&sql)
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await?;

        Ok(accounts)
    }

    // =========================================================================
    // Balance Mutation Engine
    // =========================================================================

    /// Apply a new balance to an account.
    ///
    /// Locks the row, writes the balance, marks it verified, recomputes the
    /// derived status and appends the history row, all in one transaction.
    pub async fn update_balance(
        &self,
        account_id: i64,
        new_balance: Decimal,
        changed_by: i64,
        reason: ChangeReason,
        notes: Option<&str>,
    ) -> Result<Account, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM accounts WHERE id = $1 FOR UPDATE",
            ACCOUNT_COLUMNS
        );
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(account_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Account {} not found", account_id)))?;

        let platform = sqlx::query_as::<_, Platform>(
            "SELECT id, name, display_name, is_active, created_at FROM platforms WHERE id = $1",
        )
        .bind(account.platform_id)
        .fetch_one(&mut *tx)
        .await?;

        let old_balance = account.current_balance;
        let pnl = Account {
            current_balance: new_balance,
            ..account.clone()
        }
        .pnl(&platform);
        let status = AccountStatus::derive(account.has_account, new_balance, pnl);

        let sql = format!(
            r#"
            UPDATE accounts
            SET current_balance = $2, status = $3, balance_verified = TRUE,
                last_balance_update = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        );
        let updated = sqlx::query_as::<_, Account>(&sql)
            .bind(account_id)
            .bind(new_balance)
            .bind(status.as_str())
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO balance_history
            (account_id, old_balance, new_balance, change_reason, notes, changed_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(account_id)
        .bind(old_balance)
        .bind(new_balance)
        .bind(reason.as_str())
        .bind(notes)
        .bind(changed_by)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated)
    }

    /// Snapshot every active account of a user with a close_day history row
    /// (old == new == current balance). Returns the accounts snapshotted.
    pub async fn close_day(
        &self,
        user_id: i64,
        changed_by: i64,
    ) -> Result<Vec<Account>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM accounts WHERE user_id = $1 AND is_active = TRUE ORDER BY id FOR UPDATE",
            ACCOUNT_COLUMNS
        );
        let accounts = sqlx::query_as::<_, Account>(&sql)
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await?;

        for account in &accounts {
            sqlx::query(
                r#"
                INSERT INTO balance_history
                (account_id, old_balance, new_balance, change_reason, notes, changed_by)
                VALUES ($1, $2, $2, 'close_day', 'Daily close snapshot', $3)
                "#,
            )
            .bind(account.id)
            .bind(account.current_balance)
            .bind(changed_by)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "UPDATE accounts SET last_balance_update = NOW(), updated_at = NOW() WHERE user_id = $1 AND is_active = TRUE",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(accounts)
    }

    /// Create or update the account for a (user, platform) pair.
    ///
    /// Creation seeds an initial_state history row; deactivation zeroes the
    /// balances, soft-deactivates and records an account_status_change row.
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert(
        &self,
        user_id: i64,
        platform_id: i64,
        account_name: Option<&str>,
        has_account: bool,
        initial_balance: Option<Decimal>,
        current_balance: Option<Decimal>,
        changed_by: i64,
    ) -> Result<Account, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let platform = sqlx::query_as::<_, Platform>(
            "SELECT id, name, display_name, is_active, created_at FROM platforms WHERE id = $1",
        )
        .bind(platform_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("Platform {} not found", platform_id)))?;

        let sql = format!(
            "SELECT {} FROM accounts WHERE user_id = $1 AND platform_id = $2 FOR UPDATE",
            ACCOUNT_COLUMNS
        );
        let existing = sqlx::query_as::<_, Account>(&sql)
            .bind(user_id)
            .bind(platform_id)
            .fetch_optional(&mut *tx)
            .await?;

        let account = match existing {
            None => {
                if !has_account {
                    return Err(RepositoryError::NotFound(format!(
                        "User {} has no account on platform {}",
                        user_id, platform_id
                    )));
                }

                let balance = current_balance.unwrap_or(Decimal::ZERO);
                let initial = initial_balance.unwrap_or(balance);
                let pnl = if platform.is_wallet() {
                    Decimal::ZERO
                } else {
                    balance - initial
                };
                let status = AccountStatus::derive(true, balance, pnl);

                let sql = format!(
                    r#"
                    INSERT INTO accounts
                    (user_id, platform_id, account_name, initial_balance, current_balance,
                     status, has_account, is_active)
                    VALUES ($1, $2, $3, $4, $5, $6, TRUE, TRUE)
                    RETURNING {}
                    "#,
                    ACCOUNT_COLUMNS
                );
                let created = sqlx::query_as::<_, Account>(&sql)
                    .bind(user_id)
                    .bind(platform_id)
                    .bind(account_name.unwrap_or(platform.display_name.as_str()))
                    .bind(initial)
                    .bind(balance)
                    .bind(status.as_str())
                    .fetch_one(&mut *tx)
                    .await?;

                sqlx::query(
                    r#"
                    INSERT INTO balance_history
                    (account_id, old_balance, new_balance, change_reason, notes, changed_by)
                    VALUES ($1, 0, $2, 'initial_state', 'Account created', $3)
                    "#,
                )
                .bind(created.id)
                .bind(balance)
                .bind(changed_by)
                .execute(&mut *tx)
                .await?;

                created
            }
            Some(account) if !has_account => {
                // Soft deactivation: zero out and keep the row
                let old_balance = account.current_balance;

                let sql = format!(
                    r#"
                    UPDATE accounts
                    SET current_balance = 0, initial_balance = 0, status = 'inactive',
                        has_account = FALSE, is_active = FALSE, updated_at = NOW()
                    WHERE id = $1
                    RETURNING {}
                    "#,
                    ACCOUNT_COLUMNS
                );
                let updated = sqlx::query_as::<_, Account>(&sql)
                    .bind(account.id)
                    .fetch_one(&mut *tx)
                    .await?;

                sqlx::query(
                    r#"
                    INSERT INTO balance_history
                    (account_id, old_balance, new_balance, change_reason, notes, changed_by)
                    VALUES ($1, $2, 0, 'account_status_change', 'Account deactivated', $3)
                    "#,
                )
                .bind(account.id)
                .bind(old_balance)
                .bind(changed_by)
                .execute(&mut *tx)
                .await?;

                updated
            }
            Some(account) => {
                let reactivating = !account.has_account;
                let name = account_name.unwrap_or(account.account_name.as_str());
                let initial = if reactivating {
                    initial_balance.unwrap_or(account.initial_balance)
                } else {
                    account.initial_balance
                };
                let balance = current_balance.unwrap_or(account.current_balance);

                let pnl = if platform.is_wallet() {
                    Decimal::ZERO
                } else {
                    balance - initial
                };
                let status = AccountStatus::derive(true, balance, pnl);

                let sql = format!(
                    r#"
                    UPDATE accounts
                    SET account_name = $2, initial_balance = $3, current_balance = $4,
                        status = $5, has_account = TRUE, is_active = TRUE, updated_at = NOW()
                    WHERE id = $1
                    RETURNING {}
                    "#,
                    ACCOUNT_COLUMNS
                );
                let updated = sqlx::query_as::<_, Account>(&sql)
                    .bind(account.id)
                    .bind(name)
                    .bind(initial)
                    .bind(balance)
                    .bind(status.as_str())
                    .fetch_one(&mut *tx)
                    .await?;

                if reactivating {
                    sqlx::query(
                        r#"
                        INSERT INTO balance_history
                        (account_id, old_balance, new_balance, change_reason, notes, changed_by)
                        VALUES ($1, $2, $3, 'account_status_change', 'Account activated', $4)
                        "#,
                    )
                    .bind(account.id)
                    .bind(account.current_balance)
                    .bind(balance)
                    .bind(changed_by)
                    .execute(&mut *tx)
                    .await?;
                } else if balance != account.current_balance {
                    sqlx::query(
                        r#"
                        INSERT INTO balance_history
                        (account_id, old_balance, new_balance, change_reason, notes, changed_by)
                        VALUES ($1, $2, $3, 'manual_update', 'Balance set via account upsert', $4)
                        "#,
                    )
                    .bind(account.id)
                    .bind(account.current_balance)
                    .bind(balance)
                    .bind(changed_by)
                    .execute(&mut *tx)
                    .await?;
                }

                updated
            }
        };

        tx.commit().await?;

        Ok(account)
    }
}
