use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::ownership::OwnerLookup;

/// Resource types whose mutation endpoints are ownership-gated. The binding
/// of path parameter to table happens once at route-configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnedResource {
    Video,
    Comment,
    Tweet,
    Playlist,
}

impl OwnedResource {
    /// Path parameter name carrying the resource id on its routes.
    pub fn path_param(self) -> &'static str {
        match self {
            OwnedResource::Video => "videoId",
            OwnedResource::Comment => "commentId",
            OwnedResource::Tweet => "tweetId",
            OwnedResource::Playlist => "playlistId",
        }
    }

    fn owner_query(self) -> &'static str {
        match self {
            OwnedResource::Video => "SELECT owner_id FROM videos WHERE id = $1",
            OwnedResource::Comment => "SELECT owner_id FROM comments WHERE id = $1",
            OwnedResource::Tweet => "SELECT owner_id FROM tweets WHERE id = $1",
            OwnedResource::Playlist => "SELECT owner_id FROM playlists WHERE id = $1",
        }
    }
}

/// Owner lookup for one bound resource type.
#[derive(Clone)]
pub struct ResourceOwnership {
    db_pool: PgPool,
    resource: OwnedResource,
}

impl ResourceOwnership {
    pub fn new(db_pool: PgPool, resource: OwnedResource) -> Self {
        Self { db_pool, resource }
    }
}

#[async_trait]
impl OwnerLookup for ResourceOwnership {
    async fn find_owner(&self, resource_id: Uuid) -> Result<Option<Uuid>, AppError> {
        let row = sqlx::query_as::<_, (Uuid,)>(self.resource.owner_query())
            .bind(resource_id)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(|e| {
                AppError::Database(format!(
                    "Failed to resolve owner for {:?} {}: {}",
                    self.resource, resource_id, e
                ))
            })?;

        Ok(row.map(|(owner_id,)| owner_id))
    }
}
