//! Repository for platform lookups

use crate::error::RepositoryError;
use crate::models::Platform;
use sqlx::PgPool;

pub struct PlatformRepository {
    pool: PgPool,
}

impl PlatformRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a platform
    pub async fn create(
        &self,
        name: &str,
        display_name: &str,
    ) -> Result<Platform, RepositoryError> {
        let platform = sqlx::query_as::<_, Platform>(
            r#"
            INSERT INTO platforms (name, display_name)
            VALUES ($1, $2)
            RETURNING id, name, display_name, is_active, created_at
            "#,
        )
        .bind(name)
        .bind(display_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(platform)
    }

    /// Find a platform by id
    pub async fn find_by_id(&self, platform_id: i64) -> Result<Option<Platform>, RepositoryError> {
        let platform = sqlx::query_as::<_, Platform>(
            "SELECT id, name, display_name, is_active, created_at FROM platforms WHERE id = $1",
        )
        .bind(platform_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(platform)
    }

    /// Find a platform by name (case-insensitive)
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Platform>, RepositoryError> {
        let platform = sqlx::query_as::<_, Platform>(
            "SELECT id, name, display_name, is_active, created_at FROM platforms WHERE LOWER(name) = LOWER($1)",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(platform)
    }

    /// List all platforms
    pub async fn list_all(&self) -> Result<Vec<Platform>, RepositoryError> {
        let platforms = sqlx::query_as::<_, Platform>(
            "SELECT id, name, display_name, is_active, created_at FROM platforms ORDER BY display_name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(platforms)
    }

    /// List active platforms
    pub async fn list_active(&self) -> Result<Vec<Platform>, RepositoryError> {
        let platforms = sqlx::query_as::<_, Platform>(
            r#"
            SELECT id, name, display_name, is_active, created_at
            FROM platforms
            WHERE is_active = TRUE
            ORDER BY display_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(platforms)
    }
}
