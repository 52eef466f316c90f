//! Read-only queries over the append-only balance history.
//!
//! Writers append their history rows inside their own transactions; this
//! repository only reads. Dashboards sum `new_balance - old_balance` here
//! instead of re-deriving from live account state, so historical reports
//! stay stable as current balances move.

use crate::error::RepositoryError;
use crate::models::{BalanceHistory, ChangeReason};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::PgPool;

const HISTORY_COLUMNS: &str = r#"
    id, account_id, old_balance, new_balance, change_reason, notes, changed_by, created_at
"#;

pub struct HistoryRepository {
    pool: PgPool,
}

impl HistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// History of one account, newest first
    pub async fn list_for_account(
        &self,
        account_id: i64,
        limit: i64,
    ) -> Result<Vec<BalanceHistory>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM balance_history WHERE account_id = $1 ORDER BY created_at DESC LIMIT $2",
            HISTORY_COLUMNS
        );
        let rows = sqlx::query_as::<_, BalanceHistory>(&sql)
            .bind(account_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Sum of balance deltas in a window, optionally restricted to one reason
    pub async fn sum_deltas(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        reason: Option<ChangeReason>,
    ) -> Result<Decimal, RepositoryError> {
        let sum = match reason {
            Some(reason) => {
                sqlx::query_scalar::<_, Decimal>(
                    r#"
                    SELECT COALESCE(SUM(new_balance - old_balance), 0)
                    FROM balance_history
                    WHERE created_at >= $1 AND created_at <= $2 AND change_reason = $3
                    "#,
                )
                .bind(start)
                .bind(end)
                .bind(reason.as_str())
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar::<_, Decimal>(
                    r#"
                    SELECT COALESCE(SUM(new_balance - old_balance), 0)
                    FROM balance_history
                    WHERE created_at >= $1 AND created_at <= $2
                    "#,
                )
                .bind(start)
                .bind(end)
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(sum)
    }

    /// Sum of all deltas strictly before a point in time (the cumulative
    /// baseline a series starts from)
    pub async fn sum_deltas_before(
        &self,
        before: NaiveDateTime,
    ) -> Result<Decimal, RepositoryError> {
        let sum = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(new_balance - old_balance), 0) FROM balance_history WHERE created_at < $1",
        )
        .bind(before)
        .fetch_one(&self.pool)
        .await?;

        Ok(sum)
    }

    /// Per-day delta sums over a window, ordered by day
    pub async fn daily_deltas(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<(NaiveDate, Decimal)>, RepositoryError> {
        let rows = sqlx::query_as::<_, (NaiveDate, Decimal)>(
            r#"
            SELECT created_at::date AS day, COALESCE(SUM(new_balance - old_balance), 0) AS delta
            FROM balance_history
            WHERE created_at >= $1 AND created_at <= $2
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Calendar dates on which a user closed their day (at least one
    /// close_day row on any of their active accounts)
    pub async fn close_day_dates(
        &self,
        user_id: i64,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<NaiveDate>, RepositoryError> {
        let dates = sqlx::query_scalar::<_, NaiveDate>(
            r#"
            SELECT DISTINCT bh.created_at::date
            FROM balance_history bh
            JOIN accounts a ON a.id = bh.account_id
            WHERE a.user_id = $1 AND a.is_active = TRUE
              AND bh.change_reason = 'close_day'
              AND bh.created_at >= $2 AND bh.created_at <= $3
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(dates)
    }
}
