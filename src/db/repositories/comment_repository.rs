use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub video_id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const COMMENT_COLUMNS: &str = "id, video_id, owner_id, content, created_at, updated_at";

#[derive(Clone)]
pub struct CommentRepository {
    db_pool: PgPool,
}

impl CommentRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn create(
        &self,
        video_id: &Uuid,
        owner_id: &Uuid,
        content: &str,
    ) -> Result<Comment, AppError> {
        let query = format!(
            r#"
            INSERT INTO comments (id, video_id, owner_id, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, now(), now())
            RETURNING {}
            "#,
            COMMENT_COLUMNS
        );

        sqlx::query_as::<_, Comment>(&query)
            .bind(Uuid::new_v4())
            .bind(video_id)
            .bind(owner_id)
            .bind(content)
            .fetch_one(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to create comment: {}", e)))
    }

    pub async fn list_by_video(
        &self,
        video_id: &Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Comment>, AppError> {
        let query = format!(
            r#"
            SELECT {} FROM comments
            WHERE video_id = $1
            ORDER BY created_at DESC
            OFFSET $2 LIMIT $3
            "#,
            COMMENT_COLUMNS
        );

        sqlx::query_as::<_, Comment>(&query)
            .bind(video_id)
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to list comments: {}", e)))
    }

    pub async fn update_content(&self, id: &Uuid, content: &str) -> Result<Comment, AppError> {
        let query = format!(
            "UPDATE comments SET content = $1, updated_at = now() WHERE id = $2 RETURNING {}",
            COMMENT_COLUMNS
        );

        sqlx::query_as::<_, Comment>(&query)
            .bind(content)
            .bind(id)
            .fetch_one(&self.db_pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    AppError::NotFound(format!("Comment not found: {}", id))
                }
                _ => AppError::Database(format!("Failed to update comment: {}", e)),
            })
    }

    pub async fn delete(&self, id: &Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete comment: {}", e)))?;

        Ok(())
    }
}
