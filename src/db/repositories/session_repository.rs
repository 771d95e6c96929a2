use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::auth::session_store::SessionStore;

/// Postgres-backed session store: one row per subject holding the current
/// refresh-token fingerprint. The compare-and-swap is a conditional UPDATE;
/// the row count tells a concurrent loser apart from the winner without any
/// additional locking.
#[derive(Clone)]
pub struct PgSessionStore {
    db_pool: PgPool,
}

impl PgSessionStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn set_current_fingerprint(
        &self,
        subject: Uuid,
        fingerprint: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO auth_sessions (user_id, refresh_fingerprint, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (user_id)
            DO UPDATE SET refresh_fingerprint = EXCLUDED.refresh_fingerprint, updated_at = now()
            "#,
        )
        .bind(subject)
        .bind(fingerprint)
        .execute(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to store session fingerprint: {}", e)))?;

        Ok(())
    }

    async fn get_current_fingerprint(&self, subject: Uuid) -> Result<Option<String>, AppError> {
        let row = sqlx::query_as::<_, (Option<String>,)>(
            "SELECT refresh_fingerprint FROM auth_sessions WHERE user_id = $1",
        )
        .bind(subject)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to fetch session fingerprint: {}", e)))?;

        Ok(row.and_then(|(fingerprint,)| fingerprint))
    }

    async fn replace_fingerprint_if_current(
        &self,
        subject: Uuid,
        expected: &str,
        next: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE auth_sessions
            SET refresh_fingerprint = $3, updated_at = now()
            WHERE user_id = $1 AND refresh_fingerprint = $2
            "#,
        )
        .bind(subject)
        .bind(expected)
        .bind(next)
        .execute(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to rotate session fingerprint: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn clear(&self, subject: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE auth_sessions SET refresh_fingerprint = NULL, updated_at = now() WHERE user_id = $1",
        )
        .bind(subject)
        .execute(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to clear session: {}", e)))?;

        Ok(())
    }
}
