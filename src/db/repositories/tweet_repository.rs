use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const TWEET_COLUMNS: &str = "id, owner_id, content, created_at, updated_at";

#[derive(Clone)]
pub struct TweetRepository {
    db_pool: PgPool,
}

impl TweetRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn create(&self, owner_id: &Uuid, content: &str) -> Result<Tweet, AppError> {
        let query = format!(
            r#"
            INSERT INTO tweets (id, owner_id, content, created_at, updated_at)
            VALUES ($1, $2, $3, now(), now())
            RETURNING {}
            "#,
            TWEET_COLUMNS
        );

        sqlx::query_as::<_, Tweet>(&query)
            .bind(Uuid::new_v4())
            .bind(owner_id)
            .bind(content)
            .fetch_one(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to create tweet: {}", e)))
    }

    pub async fn list_by_owner(&self, owner_id: &Uuid) -> Result<Vec<Tweet>, AppError> {
        let query = format!(
            "SELECT {} FROM tweets WHERE owner_id = $1 ORDER BY created_at DESC",
            TWEET_COLUMNS
        );

        sqlx::query_as::<_, Tweet>(&query)
            .bind(owner_id)
            .fetch_all(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to list tweets: {}", e)))
    }

    pub async fn update_content(&self, id: &Uuid, content: &str) -> Result<Tweet, AppError> {
        let query = format!(
            "UPDATE tweets SET content = $1, updated_at = now() WHERE id = $2 RETURNING {}",
            TWEET_COLUMNS
        );

        sqlx::query_as::<_, Tweet>(&query)
            .bind(content)
            .bind(id)
            .fetch_one(&self.db_pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => AppError::NotFound(format!("Tweet not found: {}", id)),
                _ => AppError::Database(format!("Failed to update tweet: {}", e)),
            })
    }

    pub async fn delete(&self, id: &Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM tweets WHERE id = $1")
            .bind(id)
            .execute(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete tweet: {}", e)))?;

        Ok(())
    }
}
