use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

/// Aggregate numbers shown on a channel owner's dashboard.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_videos: i64,
    pub total_views: i64,
    pub total_subscribers: i64,
    pub total_likes: i64,
}

#[derive(Clone)]
pub struct DashboardRepository {
    db_pool: PgPool,
}

impl DashboardRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn channel_stats(&self, channel_id: &Uuid) -> Result<ChannelStats, AppError> {
        sqlx::query_as::<_, ChannelStats>(
            r#"
            SELECT
                (SELECT count(*) FROM videos v WHERE v.owner_id = $1) AS total_videos,
                (SELECT COALESCE(sum(v.views), 0) FROM videos v WHERE v.owner_id = $1) AS total_views,
                (SELECT count(*) FROM subscriptions s WHERE s.channel_id = $1) AS total_subscribers,
                (SELECT count(*) FROM likes l JOIN videos v ON l.video_id = v.id WHERE v.owner_id = $1) AS total_likes
            "#,
        )
        .bind(channel_id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to fetch channel stats: {}", e)))
    }
}
