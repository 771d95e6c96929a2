use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::repositories::TweetRepository;
use crate::error::AppError;
use crate::models::AuthenticatedUser;

#[derive(Deserialize)]
pub struct TweetRequest {
    pub content: String,
}

/// POST /tweets
pub async fn create_tweet(
    user: AuthenticatedUser,
    payload: web::Json<TweetRequest>,
    tweets: web::Data<TweetRepository>,
) -> Result<HttpResponse, AppError> {
    if payload.content.trim().is_empty() {
        return Err(AppError::Validation("Tweet content is required".to_string()));
    }

    let tweet = tweets.create(&user.user_id, payload.content.trim()).await?;
    Ok(HttpResponse::Created().json(tweet))
}

/// GET /tweets/user/{userId}
pub async fn list_user_tweets(
    path: web::Path<Uuid>,
    tweets: web::Data<TweetRepository>,
) -> Result<HttpResponse, AppError> {
    let list = tweets.list_by_owner(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(list))
}

/// PATCH /tweets/{tweetId} — ownership-gated.
pub async fn update_tweet(
    path: web::Path<Uuid>,
    payload: web::Json<TweetRequest>,
    tweets: web::Data<TweetRepository>,
) -> Result<HttpResponse, AppError> {
    if payload.content.trim().is_empty() {
        return Err(AppError::Validation("Tweet content is required".to_string()));
    }

    let tweet = tweets
        .update_content(&path.into_inner(), payload.content.trim())
        .await?;
    Ok(HttpResponse::Ok().json(tweet))
}

/// DELETE /tweets/{tweetId} — ownership-gated.
pub async fn delete_tweet(
    path: web::Path<Uuid>,
    tweets: web::Data<TweetRepository>,
) -> Result<HttpResponse, AppError> {
    tweets.delete(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Tweet deleted" })))
}
