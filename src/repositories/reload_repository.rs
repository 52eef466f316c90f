//! Repository for reload requests and the payback engine.
//!
//! Approve, reject and settle_payback each run in one transaction; the
//! status precondition is re-checked on a row locked with FOR UPDATE, so a
//! concurrent second approval fails cleanly instead of double-crediting.

use crate::error::RepositoryError;
use crate::models::payback::{self, AccountDeduction, PaybackOutcome};
use crate::models::{Account, ReloadRequest, ReloadStatus};
use rust_decimal::Decimal;
use sqlx::PgPool;

const RELOAD_COLUMNS: &str = r#"
    id, user_id, platform_id, amount, status, paid_back, paid_back_at,
    player_notes, manager_notes, approved_by, approved_at, created_at, updated_at
"#;

const ACCOUNT_COLUMNS: &str = r#"
    id, user_id, platform_id, account_name, initial_balance, current_balance,
    total_reloads, total_withdrawals, team_withdrawal_credits,
    manual_team_investment, investment_notes, manual_reload_amount, reload_notes,
    status, has_account, last_balance_update, balance_verified, is_active,
    created_at, updated_at
"#;

pub struct ReloadRepository {
    pool: PgPool,
}

impl ReloadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a pending reload request
    pub async fn create(
        &self,
        user_id: i64,
        platform_id: i64,
        amount: Decimal,
        player_notes: Option<&str>,
    ) -> Result<ReloadRequest, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO reload_requests (user_id, platform_id, amount, player_notes)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            RELOAD_COLUMNS
        );
        let request = sqlx::query_as::<_, ReloadRequest>(&sql)
            .bind(user_id)
            .bind(platform_id)
            .bind(amount)
            .bind(player_notes)
            .fetch_one(&self.pool)
            .await?;

        Ok(request)
    }

    /// Find a reload request by id
    pub async fn find_by_id(
        &self,
        reload_id: i64,
    ) -> Result<Option<ReloadRequest>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM reload_requests WHERE id = $1",
            RELOAD_COLUMNS
        );
        let request = sqlx::query_as::<_, ReloadRequest>(&sql)
            .bind(reload_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(request)
    }

    /// List a user's reload requests, newest first
    pub async fn list_for_user(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<ReloadRequest>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM reload_requests WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
            RELOAD_COLUMNS
        );
        let requests = sqlx::query_as::<_, ReloadRequest>(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(requests)
    }

    /// List requests in a given status, oldest first (the approval queue)
    pub async fn list_by_status(
        &self,
        status: ReloadStatus,
    ) -> Result<Vec<ReloadRequest>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM reload_requests WHERE status = $1 ORDER BY created_at",
            RELOAD_COLUMNS
        );
        let requests = sqlx::query_as::<_, ReloadRequest>(&sql)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;

        Ok(requests)
    }

    /// Approved reloads the payback engine has not settled yet
    pub async fn unpaid_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<ReloadRequest>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {} FROM reload_requests
            WHERE user_id = $1 AND status = 'approved' AND paid_back = FALSE
            ORDER BY created_at
            "#,
            RELOAD_COLUMNS
        );
        let requests = sqlx::query_as::<_, ReloadRequest>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(requests)
    }

    // =========================================================================
    // Workflow transitions
    // =========================================================================

    /// Approve a pending reload: credit the (user, platform) account when it
    /// exists, append the history row, and record the reload transaction.
    pub async fn approve(
        &self,
        reload_id: i64,
        manager_id: i64,
        notes: Option<&str>,
    ) -> Result<(ReloadRequest, Option<Account>), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM reload_requests WHERE id = $1 FOR UPDATE",
            RELOAD_COLUMNS
        );
        let request = sqlx::query_as::<_, ReloadRequest>(&sql)
            .bind(reload_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                RepositoryError::NotFound(format!("Reload request {} not found", reload_id))
            })?;

        if !request.is_pending() {
            return Err(RepositoryError::NotPending {
                status: request.status.clone(),
            });
        }

        let sql = format!(
            r#"
            UPDATE reload_requests
            SET status = 'approved', manager_notes = $2, approved_by = $3,
                approved_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            RELOAD_COLUMNS
        );
        let request = sqlx::query_as::<_, ReloadRequest>(&sql)
            .bind(reload_id)
            .bind(notes)
            .bind(manager_id)
            .fetch_one(&mut *tx)
            .await?;

        let sql = format!(
            "SELECT {} FROM accounts WHERE user_id = $1 AND platform_id = $2 FOR UPDATE",
            ACCOUNT_COLUMNS
        );
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(request.user_id)
            .bind(request.platform_id)
            .fetch_optional(&mut *tx)
            .await?;

        let credited = match account {
            Some(account) => {
                let old_balance = account.current_balance;
                let new_balance = old_balance + request.amount;

                let sql = format!(
                    r#"
                    UPDATE accounts
                    SET current_balance = current_balance + $2,
                        total_reloads = total_reloads + $2, updated_at = NOW()
                    WHERE id = $1
                    RETURNING {}
                    "#,
                    ACCOUNT_COLUMNS
                );
                let updated = sqlx::query_as::<_, Account>(&sql)
                    .bind(account.id)
                    .bind(request.amount)
                    .fetch_one(&mut *tx)
                    .await?;

                sqlx::query(
                    r#"
                    INSERT INTO balance_history
                    (account_id, old_balance, new_balance, change_reason, notes, changed_by)
                    VALUES ($1, $2, $3, 'reload_approved', $4, $5)
                    "#,
                )
                .bind(account.id)
                .bind(old_balance)
                .bind(new_balance)
                .bind(format!("Reload approved - request #{}", request.id))
                .bind(manager_id)
                .execute(&mut *tx)
                .await?;

                Some(updated)
            }
            None => None,
        };

        sqlx::query(
            r#"
            INSERT INTO transactions
            (user_id, platform_id, transaction_type, amount, description, reload_request_id, created_by)
            VALUES ($1, $2, 'reload', $3, $4, $5, $6)
            "#,
        )
        .bind(request.user_id)
        .bind(request.platform_id)
        .bind(request.amount)
        .bind(format!("Reload approved - request #{}", request.id))
        .bind(request.id)
        .bind(manager_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((request, credited))
    }

    /// Reject a pending reload. No balance effect.
    pub async fn reject(
        &self,
        reload_id: i64,
        manager_id: i64,
        notes: &str,
    ) -> Result<ReloadRequest, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM reload_requests WHERE id = $1 FOR UPDATE",
            RELOAD_COLUMNS
        );
        let request = sqlx::query_as::<_, ReloadRequest>(&sql)
            .bind(reload_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                RepositoryError::NotFound(format!("Reload request {} not found", reload_id))
            })?;

        if !request.is_pending() {
            return Err(RepositoryError::NotPending {
                status: request.status.clone(),
            });
        }

        let sql = format!(
            r#"
            UPDATE reload_requests
            SET status = 'rejected', manager_notes = $2, approved_by = $3,
                approved_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            RELOAD_COLUMNS
        );
        let request = sqlx::query_as::<_, ReloadRequest>(&sql)
            .bind(reload_id)
            .bind(notes)
            .bind(manager_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(request)
    }

    // =========================================================================
    // Payback engine
    // =========================================================================

    /// Settle every unpaid approved reload of a user against their funded
    /// balances, proportionally per account.
    ///
    /// Either all deductions, history rows and paid_back flags commit, or
    /// none do. Returns an empty outcome when nothing is outstanding.
    pub async fn settle_payback(
        &self,
        user_id: i64,
        changed_by: i64,
    ) -> Result<PaybackOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            SELECT {} FROM reload_requests
            WHERE user_id = $1 AND status = 'approved' AND paid_back = FALSE
            ORDER BY created_at
            FOR UPDATE
            "#,
            RELOAD_COLUMNS
        );
        let unpaid = sqlx::query_as::<_, ReloadRequest>(&sql)
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await?;

        let sql = format!(
            r#"
            SELECT {} FROM accounts
            WHERE user_id = $1 AND is_active = TRUE AND has_account = TRUE
            ORDER BY id
            FOR UPDATE
            "#,
            ACCOUNT_COLUMNS
        );
        let accounts = sqlx::query_as::<_, Account>(&sql)
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await?;

        let total_balance: Decimal = accounts.iter().map(|a| a.current_balance).sum();

        if unpaid.is_empty() {
            return Ok(PaybackOutcome::empty(total_balance));
        }

        let total_unpaid: Decimal = unpaid.iter().map(|r| r.amount).sum();
        if total_balance < total_unpaid {
            return Err(RepositoryError::Insufficient {
                available: total_balance,
                required: total_unpaid,
            });
        }

        let balances: Vec<(i64, Decimal)> =
            accounts.iter().map(|a| (a.id, a.current_balance)).collect();
        let plan = payback::plan_deductions(&balances, total_unpaid);

        let planned: Decimal = plan.iter().map(|(_, d)| *d).sum();
        if planned != total_unpaid {
            return Err(RepositoryError::BusinessRule(format!(
                "Payback plan covers {} of {} unpaid",
                planned, total_unpaid
            )));
        }

        let mut deductions = Vec::new();
        for account in &accounts {
            let deduction = plan
                .iter()
                .find(|(id, _)| *id == account.id)
                .map(|(_, amount)| *amount);
            let amount = match deduction {
                Some(amount) => amount,
                None => continue,
            };

            let old_balance = account.current_balance;
            let new_balance = old_balance - amount;

            sqlx::query("UPDATE accounts SET current_balance = $2, updated_at = NOW() WHERE id = $1")
                .bind(account.id)
                .bind(new_balance)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                r#"
                INSERT INTO balance_history
                (account_id, old_balance, new_balance, change_reason, notes, changed_by)
                VALUES ($1, $2, $3, 'reload_payback', $4, $5)
                "#,
            )
            .bind(account.id)
            .bind(old_balance)
            .bind(new_balance)
            .bind(format!("Reload payback settlement of {}", total_unpaid))
            .bind(changed_by)
            .execute(&mut *tx)
            .await?;

            let platform_name = sqlx::query_scalar::<_, String>(
                "SELECT display_name FROM platforms WHERE id = $1",
            )
            .bind(account.platform_id)
            .fetch_one(&mut *tx)
            .await?;

            deductions.push(AccountDeduction {
                account_id: account.id,
                platform_name,
                amount_deducted: amount,
                old_balance,
                new_balance,
            });
        }

        let settled_ids: Vec<i64> = unpaid.iter().map(|r| r.id).collect();
        sqlx::query(
            r#"
            UPDATE reload_requests
            SET paid_back = TRUE, paid_back_at = NOW(), updated_at = NOW()
            WHERE id = ANY($1)
            "#,
        )
        .bind(&settled_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(PaybackOutcome {
            total_paid_back: total_unpaid,
            deductions,
            reloads_settled: settled_ids,
            remaining_balance: total_balance - total_unpaid,
        })
    }
}
