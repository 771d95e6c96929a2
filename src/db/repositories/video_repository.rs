use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub video_public_id: String,
    pub thumbnail_url: Option<String>,
    pub duration_secs: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const VIDEO_COLUMNS: &str = "id, owner_id, title, description, video_url, video_public_id, thumbnail_url, duration_secs, views, is_published, created_at, updated_at";

#[derive(Clone)]
pub struct VideoRepository {
    db_pool: PgPool,
}

impl VideoRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        owner_id: &Uuid,
        title: &str,
        description: Option<&str>,
        video_url: &str,
        video_public_id: &str,
        thumbnail_url: Option<&str>,
        duration_secs: f64,
    ) -> Result<Video, AppError> {
        let query = format!(
            r#"
            INSERT INTO videos (id, owner_id, title, description, video_url, video_public_id, thumbnail_url, duration_secs, views, is_published, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, true, now(), now())
            RETURNING {}
            "#,
            VIDEO_COLUMNS
        );

        sqlx::query_as::<_, Video>(&query)
            .bind(Uuid::new_v4())
            .bind(owner_id)
            .bind(title)
            .bind(description)
            .bind(video_url)
            .bind(video_public_id)
            .bind(thumbnail_url)
            .bind(duration_secs)
            .fetch_one(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to create video: {}", e)))
    }

    pub async fn get_by_id(&self, id: &Uuid) -> Result<Video, AppError> {
        let query = format!("SELECT {} FROM videos WHERE id = $1", VIDEO_COLUMNS);
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_one(&self.db_pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => AppError::NotFound(format!("Video not found: {}", id)),
                _ => AppError::Database(format!("Failed to fetch video: {}", e)),
            })
    }

    /// Newest-first page of published videos.
    pub async fn list_published(&self, offset: i64, limit: i64) -> Result<Vec<Video>, AppError> {
        let query = format!(
            r#"
            SELECT {} FROM videos
            WHERE is_published = true
            ORDER BY created_at DESC
            OFFSET $1 LIMIT $2
            "#,
            VIDEO_COLUMNS
        );

        sqlx::query_as::<_, Video>(&query)
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to list videos: {}", e)))
    }

    pub async fn list_by_owner(&self, owner_id: &Uuid) -> Result<Vec<Video>, AppError> {
        let query = format!(
            "SELECT {} FROM videos WHERE owner_id = $1 ORDER BY created_at DESC",
            VIDEO_COLUMNS
        );

        sqlx::query_as::<_, Video>(&query)
            .bind(owner_id)
            .fetch_all(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to list owner videos: {}", e)))
    }

    pub async fn update_details(
        &self,
        id: &Uuid,
        title: Option<&str>,
        description: Option<&str>,
        thumbnail_url: Option<&str>,
    ) -> Result<Video, AppError> {
        let query = format!(
            r#"
            UPDATE videos
            SET title = COALESCE($1, title),
                description = COALESCE($2, description),
                thumbnail_url = COALESCE($3, thumbnail_url),
                updated_at = now()
            WHERE id = $4
            RETURNING {}
            "#,
            VIDEO_COLUMNS
        );

        sqlx::query_as::<_, Video>(&query)
            .bind(title)
            .bind(description)
            .bind(thumbnail_url)
            .bind(id)
            .fetch_one(&self.db_pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => AppError::NotFound(format!("Video not found: {}", id)),
                _ => AppError::Database(format!("Failed to update video: {}", e)),
            })
    }

    pub async fn toggle_publish(&self, id: &Uuid) -> Result<Video, AppError> {
        let query = format!(
            "UPDATE videos SET is_published = NOT is_published, updated_at = now() WHERE id = $1 RETURNING {}",
            VIDEO_COLUMNS
        );

        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_one(&self.db_pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => AppError::NotFound(format!("Video not found: {}", id)),
                _ => AppError::Database(format!("Failed to toggle publish state: {}", e)),
            })
    }

    pub async fn increment_views(&self, id: &Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE videos SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to count view: {}", e)))?;

        Ok(())
    }

    pub async fn delete(&self, id: &Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete video: {}", e)))?;

        Ok(())
    }
}
