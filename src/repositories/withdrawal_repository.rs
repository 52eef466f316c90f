//! Repository for withdrawal requests.
//!
//! Approval applies the 50/50 settlement rule: only the player half leaves
//! the platform balance, the team half accrues to team_withdrawal_credits,
//! and the full amount counts toward total_withdrawals.

use crate::error::RepositoryError;
use crate::models::withdrawal::split_amount;
use crate::models::{Account, WithdrawalRequest, WithdrawalStatus};
use rust_decimal::Decimal;
use sqlx::PgPool;

const WITHDRAWAL_COLUMNS: &str = r#"
    id, user_id, platform_id, amount, status, player_notes, manager_notes,
    approved_by, approved_at, completed_at, created_at, updated_at
"#;

const ACCOUNT_COLUMNS: &str = r#"
    id, user_id, platform_id, account_name, initial_balance, current_balance,
    total_reloads, total_withdrawals, team_withdrawal_credits,
    manual_team_investment, investment_notes, manual_reload_amount, reload_notes,
    status, has_account, last_balance_update, balance_verified, is_active,
    created_at, updated_at
"#;

pub struct WithdrawalRepository {
    pool: PgPool,
}

impl WithdrawalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a pending withdrawal request
    pub async fn create(
        &self,
        user_id: i64,
        platform_id: i64,
        amount: Decimal,
        player_notes: Option<&str>,
    ) -> Result<WithdrawalRequest, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO withdrawal_requests (user_id, platform_id, amount, player_notes)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            WITHDRAWAL_COLUMNS
        );
        let request = sqlx::query_as::<_, WithdrawalRequest>(&sql)
            .bind(user_id)
            .bind(platform_id)
            .bind(amount)
            .bind(player_notes)
            .fetch_one(&self.pool)
            .await?;

        Ok(request)
    }

    /// Find a withdrawal request by id
    pub async fn find_by_id(
        &self,
        withdrawal_id: i64,
    ) -> Result<Option<WithdrawalRequest>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM withdrawal_requests WHERE id = $1",
            WITHDRAWAL_COLUMNS
        );
        let request = sqlx::query_as::<_, WithdrawalRequest>(&sql)
            .bind(withdrawal_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(request)
    }

    /// List a user's withdrawal requests, newest first
    pub async fn list_for_user(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<WithdrawalRequest>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM withdrawal_requests WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
            WITHDRAWAL_COLUMNS
        );
        let requests = sqlx::query_as::<_, WithdrawalRequest>(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(requests)
    }

    /// List requests in a given status, oldest first
    pub async fn list_by_status(
        &self,
        status: WithdrawalStatus,
    ) -> Result<Vec<WithdrawalRequest>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM withdrawal_requests WHERE status = $1 ORDER BY created_at",
            WITHDRAWAL_COLUMNS
        );
        let requests = sqlx::query_as::<_, WithdrawalRequest>(&sql)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;

        Ok(requests)
    }

    // =========================================================================
    // Workflow transitions
    // =========================================================================

    /// Approve a pending withdrawal, applying the 50/50 split.
    ///
    /// The balance is re-checked here, not just at creation time, since the
    /// account may have moved while the request sat pending.
    pub async fn approve(
        &self,
        withdrawal_id: i64,
        manager_id: i64,
        notes: Option<&str>,
    ) -> Result<(WithdrawalRequest, Account), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM withdrawal_requests WHERE id = $1 FOR UPDATE",
            WITHDRAWAL_COLUMNS
        );
        let request = sqlx::query_as::<_, WithdrawalRequest>(&sql)
            .bind(withdrawal_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                RepositoryError::NotFound(format!("Withdrawal request {} not found", withdrawal_id))
            })?;

        if !request.is_pending() {
            return Err(RepositoryError::NotPending {
                status: request.status.clone(),
            });
        }

        let sql = format!(
            "SELECT {} FROM accounts WHERE user_id = $1 AND platform_id = $2 FOR UPDATE",
            ACCOUNT_COLUMNS
        );
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(request.user_id)
            .bind(request.platform_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                RepositoryError::NotFound(format!(
                    "User {} has no account on platform {}",
                    request.user_id, request.platform_id
                ))
            })?;

        if account.current_balance < request.amount {
            return Err(RepositoryError::Insufficient {
                available: account.current_balance,
                required: request.amount,
            });
        }

        // 50/50 settlement: only the player half leaves the balance
        let (player_portion, team_portion) = split_amount(request.amount);
        let old_balance = account.current_balance;
        let new_balance = old_balance - player_portion;

        let sql = format!(
            r#"
            UPDATE accounts
            SET current_balance = $2, total_withdrawals = total_withdrawals + $3,
                team_withdrawal_credits = team_withdrawal_credits + $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        );
        let updated_account = sqlx::query_as::<_, Account>(&sql)
            .bind(account.id)
            .bind(new_balance)
            .bind(request.amount)
            .bind(team_portion)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO balance_history
            (account_id, old_balance, new_balance, change_reason, notes, changed_by)
            VALUES ($1, $2, $3, 'withdrawal_approved', $4, $5)
            "#,
        )
        .bind(account.id)
        .bind(old_balance)
        .bind(new_balance)
        .bind(format!(
            "Withdrawal approved: {} | Total: {}, Player: {}, Team: {}",
            notes.unwrap_or(""),
            request.amount,
            player_portion,
            team_portion
        ))
        .bind(manager_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO transactions
            (user_id, platform_id, transaction_type, amount, description, created_by)
            VALUES ($1, $2, 'withdrawal', $3, $4, $5)
            "#,
        )
        .bind(request.user_id)
        .bind(request.platform_id)
        .bind(request.amount)
        .bind(format!("Withdrawal approved - request #{}", request.id))
        .bind(manager_id)
        .execute(&mut *tx)
        .await?;

        let sql = format!(
            r#"
            UPDATE withdrawal_requests
            SET status = 'approved', manager_notes = $2, approved_by = $3,
                approved_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            WITHDRAWAL_COLUMNS
        );
        let request = sqlx::query_as::<_, WithdrawalRequest>(&sql)
            .bind(withdrawal_id)
            .bind(notes)
            .bind(manager_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok((request, updated_account))
    }

    /// Reject a pending withdrawal. No balance effect.
    pub async fn reject(
        &self,
        withdrawal_id: i64,
        manager_id: i64,
        notes: &str,
    ) -> Result<WithdrawalRequest, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM withdrawal_requests WHERE id = $1 FOR UPDATE",
            WITHDRAWAL_COLUMNS
        );
        let request = sqlx::query_as::<_, WithdrawalRequest>(&sql)
            .bind(withdrawal_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                RepositoryError::NotFound(format!("Withdrawal request {} not found", withdrawal_id))
            })?;

        if !request.is_pending() {
            return Err(RepositoryError::NotPending {
                status: request.status.clone(),
            });
        }

        let sql = format!(
            r#"
            UPDATE withdrawal_requests
            SET status = 'rejected', manager_notes = $2, approved_by = $3,
                approved_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            WITHDRAWAL_COLUMNS
        );
        let request = sqlx::query_as::<_, WithdrawalRequest>(&sql)
            .bind(withdrawal_id)
            .bind(notes)
            .bind(manager_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(request)
    }

    /// Mark an approved withdrawal as completed. The balance effect already
    /// happened at approval; this only records settlement.
    pub async fn complete(
        &self,
        withdrawal_id: i64,
        notes: Option<&str>,
    ) -> Result<WithdrawalRequest, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM withdrawal_requests WHERE id = $1 FOR UPDATE",
            WITHDRAWAL_COLUMNS
        );
        let request = sqlx::query_as::<_, WithdrawalRequest>(&sql)
            .bind(withdrawal_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                RepositoryError::NotFound(format!("Withdrawal request {} not found", withdrawal_id))
            })?;

        if request.status_enum() != WithdrawalStatus::Approved {
            return Err(RepositoryError::BusinessRule(format!(
                "Request must be approved first (status: {})",
                request.status
            )));
        }

        let sql = format!(
            r#"
            UPDATE withdrawal_requests
            SET status = 'completed', completed_at = NOW(), updated_at = NOW(),
                manager_notes = CASE
                    WHEN $2::text IS NULL THEN manager_notes
                    ELSE COALESCE(manager_notes || ' | ', '') || $2
                END
            WHERE id = $1
            RETURNING {}
            "#,
            WITHDRAWAL_COLUMNS
        );
        let request = sqlx::query_as::<_, WithdrawalRequest>(&sql)
            .bind(withdrawal_id)
            .bind(notes)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(request)
    }
}
