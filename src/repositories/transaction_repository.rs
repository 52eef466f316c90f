//! Repository for the immutable transaction log

use crate::error::RepositoryError;
use crate::models::{Transaction, TransactionType};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::PgPool;

const TRANSACTION_COLUMNS: &str = r#"
    id, user_id, platform_id, transaction_type, amount, description,
    reload_request_id, created_by, created_at
"#;

pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a transaction
    pub async fn create(
        &self,
        user_id: i64,
        platform_id: i64,
        tx_type: TransactionType,
        amount: Decimal,
        description: Option<&str>,
        reload_request_id: Option<i64>,
        created_by: i64,
    ) -> Result<Transaction, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO transactions
            (user_id, platform_id, transaction_type, amount, description, reload_request_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        );
        let transaction = sqlx::query_as::<_, Transaction>(&sql)
            .bind(user_id)
            .bind(platform_id)
            .bind(tx_type.as_str())
            .bind(amount)
            .bind(description)
            .bind(reload_request_id)
            .bind(created_by)
            .fetch_one(&self.pool)
            .await?;

        Ok(transaction)
    }

    /// Get transaction history for a user, newest first
    pub async fn list_for_user(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM transactions WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
            TRANSACTION_COLUMNS
        );
        let transactions = sqlx::query_as::<_, Transaction>(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(transactions)
    }

    /// Most recent transactions across the team
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Transaction>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM transactions ORDER BY created_at DESC LIMIT $1",
            TRANSACTION_COLUMNS
        );
        let transactions = sqlx::query_as::<_, Transaction>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(transactions)
    }

    /// Per-type amount totals over a window, for the financial summary
    pub async fn sums_by_type(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<(String, Decimal)>, RepositoryError> {
        let sums = sqlx::query_as::<_, (String, Decimal)>(
            r#"
            SELECT transaction_type, COALESCE(SUM(amount), 0)
            FROM transactions
            WHERE created_at >= $1 AND created_at <= $2
            GROUP BY transaction_type
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(sums)
    }
}
