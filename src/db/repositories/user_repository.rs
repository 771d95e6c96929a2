use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::UserLookup;
use crate::models::AuthenticatedUser;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public channel view of a user, with subscription aggregates.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub subscribers_count: i64,
    pub subscribed_to_count: i64,
    pub is_subscribed: bool,
}

const USER_COLUMNS: &str =
    "id, username, email, full_name, password_hash, avatar_url, cover_image_url, created_at, updated_at";

#[derive(Clone)]
pub struct UserRepository {
    db_pool: PgPool,
}

impl UserRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    // Get user by ID, failing if absent
    pub async fn get_by_id(&self, id: &Uuid) -> Result<User, AppError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_one(&self.db_pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => AppError::NotFound(format!("User not found: {}", id)),
                _ => AppError::Database(format!("Failed to fetch user: {}", e)),
            })?;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to fetch user: {}", e)))
    }

    // Login key resolution: a single identifier matching either username or email
    pub async fn find_by_login_key(&self, identifier: &str) -> Result<Option<User>, AppError> {
        let query = format!(
            "SELECT {} FROM users WHERE username = $1 OR email = $1",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .bind(identifier.to_lowercase())
            .fetch_optional(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to fetch user by login key: {}", e)))
    }

    pub async fn exists_with_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<bool, AppError> {
        let row = sqlx::query_as::<_, (bool,)>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR email = $2)",
        )
        .bind(username.to_lowercase())
        .bind(email.to_lowercase())
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to check user existence: {}", e)))?;

        Ok(row.0)
    }

    // Create a new user
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        full_name: Option<&str>,
        avatar_url: Option<&str>,
        cover_image_url: Option<&str>,
    ) -> Result<User, AppError> {
        let id = Uuid::new_v4();

        let query = format!(
            r#"
            INSERT INTO users (id, username, email, password_hash, full_name, avatar_url, cover_image_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, now(), now())
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(username.to_lowercase())
            .bind(email.to_lowercase())
            .bind(password_hash)
            .bind(full_name)
            .bind(avatar_url)
            .bind(cover_image_url)
            .fetch_one(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to create user: {}", e)))
    }

    pub async fn update_password_hash(
        &self,
        id: &Uuid,
        password_hash: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to update password: {}", e)))?;

        Ok(())
    }

    pub async fn update_profile(
        &self,
        id: &Uuid,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, AppError> {
        // Preserve fields that are not being updated
        let current = self.get_by_id(id).await?;

        let query = format!(
            r#"
            UPDATE users
            SET full_name = $1,
                email = $2,
                updated_at = now()
            WHERE id = $3
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(full_name.or(current.full_name.as_deref()))
            .bind(email.map(|e| e.to_lowercase()).unwrap_or(current.email))
            .bind(id)
            .fetch_one(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to update user: {}", e)))
    }

    pub async fn update_avatar(&self, id: &Uuid, avatar_url: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET avatar_url = $1, updated_at = now() WHERE id = $2")
            .bind(avatar_url)
            .bind(id)
            .execute(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to update avatar: {}", e)))?;

        Ok(())
    }

    pub async fn update_cover_image(
        &self,
        id: &Uuid,
        cover_image_url: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET cover_image_url = $1, updated_at = now() WHERE id = $2")
            .bind(cover_image_url)
            .bind(id)
            .execute(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to update cover image: {}", e)))?;

        Ok(())
    }

    /// Public channel profile with subscriber aggregates, as seen by `viewer`.
    pub async fn get_channel_profile(
        &self,
        username: &str,
        viewer: Option<&Uuid>,
    ) -> Result<Option<ChannelProfile>, AppError> {
        sqlx::query_as::<_, ChannelProfile>(
            r#"
            SELECT u.id,
                   u.username,
                   u.full_name,
                   u.avatar_url,
                   u.cover_image_url,
                   (SELECT count(*) FROM subscriptions s WHERE s.channel_id = u.id) AS subscribers_count,
                   (SELECT count(*) FROM subscriptions s WHERE s.subscriber_id = u.id) AS subscribed_to_count,
                   EXISTS(
                       SELECT 1 FROM subscriptions s
                       WHERE s.channel_id = u.id AND s.subscriber_id = $2
                   ) AS is_subscribed
            FROM users u
            WHERE u.username = $1
            "#,
        )
        .bind(username.to_lowercase())
        .bind(viewer)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to fetch channel profile: {}", e)))
    }
}

#[async_trait]
impl UserLookup for UserRepository {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthenticatedUser>, AppError> {
        let user = self.find_by_id(&id).await?;
        Ok(user.map(|u| AuthenticatedUser {
            user_id: u.id,
            username: u.username,
            email: u.email,
            full_name: u.full_name,
        }))
    }
}
