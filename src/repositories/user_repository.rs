//! Repository for user lookups

use crate::error::RepositoryError;
use crate::models::User;
use sqlx::PgPool;

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by id
    pub async fn find_by_id(&self, user_id: i64) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, full_name, role, is_active, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, full_name, role, is_active, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// List all active players (the team roster the dashboards iterate)
    pub async fn list_active_players(&self) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, full_name, role, is_active, created_at
            FROM users
            WHERE role = 'player' AND is_active = TRUE
            ORDER BY full_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
