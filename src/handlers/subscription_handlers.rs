use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::db::repositories::{SubscriptionRepository, UserRepository};
use crate::error::AppError;
use crate::models::AuthenticatedUser;

/// PATCH /subscriptions/c/{channelId}
pub async fn toggle_subscription(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    subscriptions: web::Data<SubscriptionRepository>,
    users: web::Data<UserRepository>,
) -> Result<HttpResponse, AppError> {
    let channel_id = path.into_inner();

    // The channel must exist before a subscription can point at it.
    users
        .find_by_id(&channel_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Channel not found: {}", channel_id)))?;

    let subscribed = subscriptions.toggle(&user.user_id, &channel_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "subscribed": subscribed })))
}

/// GET /subscriptions/c/{channelId} — the channel's subscribers.
pub async fn list_subscribers(
    path: web::Path<Uuid>,
    subscriptions: web::Data<SubscriptionRepository>,
) -> Result<HttpResponse, AppError> {
    let list = subscriptions.list_subscribers(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(list))
}

/// GET /subscriptions/u/{subscriberId} — channels the user subscribes to.
pub async fn list_subscribed_channels(
    path: web::Path<Uuid>,
    subscriptions: web::Data<SubscriptionRepository>,
) -> Result<HttpResponse, AppError> {
    let list = subscriptions
        .list_subscribed_channels(&path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(list))
}
