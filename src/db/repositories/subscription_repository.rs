use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

/// Lightweight public view of a channel/user in subscription listings.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Clone)]
pub struct SubscriptionRepository {
    db_pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Returns whether the subscriber is subscribed to the channel after the
    /// toggle.
    pub async fn toggle(
        &self,
        subscriber_id: &Uuid,
        channel_id: &Uuid,
    ) -> Result<bool, AppError> {
        if subscriber_id == channel_id {
            return Err(AppError::Validation(
                "Cannot subscribe to your own channel".to_string(),
            ));
        }

        let deleted =
            sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2")
                .bind(subscriber_id)
                .bind(channel_id)
                .execute(&self.db_pool)
                .await
                .map_err(|e| AppError::Database(format!("Failed to toggle subscription: {}", e)))?;

        if deleted.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO subscriptions (id, subscriber_id, channel_id, created_at)
            VALUES ($1, $2, $3, now())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(subscriber_id)
        .bind(channel_id)
        .execute(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to toggle subscription: {}", e)))?;

        Ok(true)
    }

    /// Users subscribed to the given channel.
    pub async fn list_subscribers(&self, channel_id: &Uuid) -> Result<Vec<ChannelInfo>, AppError> {
        sqlx::query_as::<_, ChannelInfo>(
            r#"
            SELECT u.id, u.username, u.full_name, u.avatar_url
            FROM users u
            JOIN subscriptions s ON s.subscriber_id = u.id
            WHERE s.channel_id = $1
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(channel_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list subscribers: {}", e)))
    }

    /// Channels the given user is subscribed to.
    pub async fn list_subscribed_channels(
        &self,
        subscriber_id: &Uuid,
    ) -> Result<Vec<ChannelInfo>, AppError> {
        sqlx::query_as::<_, ChannelInfo>(
            r#"
            SELECT u.id, u.username, u.full_name, u.avatar_url
            FROM users u
            JOIN subscriptions s ON s.channel_id = u.id
            WHERE s.subscriber_id = $1
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(subscriber_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list subscribed channels: {}", e)))
    }
}
