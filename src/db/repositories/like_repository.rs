use sqlx::PgPool;
use uuid::Uuid;

use crate::db::repositories::video_repository::Video;
use crate::error::AppError;

/// Like target; exactly one column of the likes row is non-null.
#[derive(Debug, Clone, Copy)]
enum LikeTarget {
    Video,
    Comment,
    Tweet,
}

impl LikeTarget {
    fn column(self) -> &'static str {
        match self {
            LikeTarget::Video => "video_id",
            LikeTarget::Comment => "comment_id",
            LikeTarget::Tweet => "tweet_id",
        }
    }
}

#[derive(Clone)]
pub struct LikeRepository {
    db_pool: PgPool,
}

impl LikeRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    async fn toggle(
        &self,
        user_id: &Uuid,
        target: LikeTarget,
        target_id: &Uuid,
    ) -> Result<bool, AppError> {
        let column = target.column();

        let delete_query = format!("DELETE FROM likes WHERE user_id = $1 AND {} = $2", column);
        let deleted = sqlx::query(&delete_query)
            .bind(user_id)
            .bind(target_id)
            .execute(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to toggle like: {}", e)))?;

        if deleted.rows_affected() > 0 {
            return Ok(false);
        }

        let insert_query = format!(
            "INSERT INTO likes (id, user_id, {}, created_at) VALUES ($1, $2, $3, now())",
            column
        );
        sqlx::query(&insert_query)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(target_id)
            .execute(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to toggle like: {}", e)))?;

        Ok(true)
    }

    /// Returns whether the video is liked after the toggle.
    pub async fn toggle_video_like(
        &self,
        user_id: &Uuid,
        video_id: &Uuid,
    ) -> Result<bool, AppError> {
        self.toggle(user_id, LikeTarget::Video, video_id).await
    }

    pub async fn toggle_comment_like(
        &self,
        user_id: &Uuid,
        comment_id: &Uuid,
    ) -> Result<bool, AppError> {
        self.toggle(user_id, LikeTarget::Comment, comment_id).await
    }

    pub async fn toggle_tweet_like(
        &self,
        user_id: &Uuid,
        tweet_id: &Uuid,
    ) -> Result<bool, AppError> {
        self.toggle(user_id, LikeTarget::Tweet, tweet_id).await
    }

    pub async fn list_liked_videos(&self, user_id: &Uuid) -> Result<Vec<Video>, AppError> {
        sqlx::query_as::<_, Video>(
            r#"
            SELECT v.id, v.owner_id, v.title, v.description, v.video_url, v.video_public_id,
                   v.thumbnail_url, v.duration_secs, v.views, v.is_published, v.created_at, v.updated_at
            FROM videos v
            JOIN likes l ON l.video_id = v.id
            WHERE l.user_id = $1
            ORDER BY l.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list liked videos: {}", e)))
    }
}
