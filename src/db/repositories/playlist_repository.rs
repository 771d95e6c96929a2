use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::repositories::video_repository::Video;
use crate::error::AppError;

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const PLAYLIST_COLUMNS: &str = "id, owner_id, name, description, created_at, updated_at";

#[derive(Clone)]
pub struct PlaylistRepository {
    db_pool: PgPool,
}

impl PlaylistRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn create(
        &self,
        owner_id: &Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Playlist, AppError> {
        let query = format!(
            r#"
            INSERT INTO playlists (id, owner_id, name, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, now(), now())
            RETURNING {}
            "#,
            PLAYLIST_COLUMNS
        );

        sqlx::query_as::<_, Playlist>(&query)
            .bind(Uuid::new_v4())
            .bind(owner_id)
            .bind(name)
            .bind(description)
            .fetch_one(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to create playlist: {}", e)))
    }

    pub async fn get_by_id(&self, id: &Uuid) -> Result<Playlist, AppError> {
        let query = format!("SELECT {} FROM playlists WHERE id = $1", PLAYLIST_COLUMNS);
        sqlx::query_as::<_, Playlist>(&query)
            .bind(id)
            .fetch_one(&self.db_pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    AppError::NotFound(format!("Playlist not found: {}", id))
                }
                _ => AppError::Database(format!("Failed to fetch playlist: {}", e)),
            })
    }

    pub async fn list_by_owner(&self, owner_id: &Uuid) -> Result<Vec<Playlist>, AppError> {
        let query = format!(
            "SELECT {} FROM playlists WHERE owner_id = $1 ORDER BY created_at DESC",
            PLAYLIST_COLUMNS
        );

        sqlx::query_as::<_, Playlist>(&query)
            .bind(owner_id)
            .fetch_all(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to list playlists: {}", e)))
    }

    pub async fn update_details(
        &self,
        id: &Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Playlist, AppError> {
        let query = format!(
            r#"
            UPDATE playlists
            SET name = COALESCE($1, name),
                description = COALESCE($2, description),
                updated_at = now()
            WHERE id = $3
            RETURNING {}
            "#,
            PLAYLIST_COLUMNS
        );

        sqlx::query_as::<_, Playlist>(&query)
            .bind(name)
            .bind(description)
            .bind(id)
            .fetch_one(&self.db_pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    AppError::NotFound(format!("Playlist not found: {}", id))
                }
                _ => AppError::Database(format!("Failed to update playlist: {}", e)),
            })
    }

    pub async fn delete(&self, id: &Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM playlists WHERE id = $1")
            .bind(id)
            .execute(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete playlist: {}", e)))?;

        Ok(())
    }

    pub async fn add_video(&self, playlist_id: &Uuid, video_id: &Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO playlist_videos (playlist_id, video_id, position)
            VALUES ($1, $2, COALESCE((SELECT max(position) + 1 FROM playlist_videos WHERE playlist_id = $1), 0))
            ON CONFLICT (playlist_id, video_id) DO NOTHING
            "#,
        )
        .bind(playlist_id)
        .bind(video_id)
        .execute(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to add video to playlist: {}", e)))?;

        Ok(())
    }

    pub async fn remove_video(&self, playlist_id: &Uuid, video_id: &Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = $1 AND video_id = $2")
            .bind(playlist_id)
            .bind(video_id)
            .execute(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to remove video from playlist: {}", e)))?;

        Ok(())
    }

    pub async fn list_videos(&self, playlist_id: &Uuid) -> Result<Vec<Video>, AppError> {
        sqlx::query_as::<_, Video>(
            r#"
            SELECT v.id, v.owner_id, v.title, v.description, v.video_url, v.video_public_id,
                   v.thumbnail_url, v.duration_secs, v.views, v.is_published, v.created_at, v.updated_at
            FROM videos v
            JOIN playlist_videos pv ON pv.video_id = v.id
            WHERE pv.playlist_id = $1
            ORDER BY pv.position
            "#,
        )
        .bind(playlist_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list playlist videos: {}", e)))
    }
}
