use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::db::repositories::LikeRepository;
use crate::error::AppError;
use crate::models::AuthenticatedUser;

/// PATCH /likes/toggle/v/{videoId}
pub async fn toggle_video_like(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    likes: web::Data<LikeRepository>,
) -> Result<HttpResponse, AppError> {
    let liked = likes
        .toggle_video_like(&user.user_id, &path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "liked": liked })))
}

/// PATCH /likes/toggle/c/{commentId}
pub async fn toggle_comment_like(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    likes: web::Data<LikeRepository>,
) -> Result<HttpResponse, AppError> {
    let liked = likes
        .toggle_comment_like(&user.user_id, &path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "liked": liked })))
}

/// PATCH /likes/toggle/t/{tweetId}
pub async fn toggle_tweet_like(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    likes: web::Data<LikeRepository>,
) -> Result<HttpResponse, AppError> {
    let liked = likes
        .toggle_tweet_like(&user.user_id, &path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "liked": liked })))
}

/// GET /likes/videos
pub async fn list_liked_videos(
    user: AuthenticatedUser,
    likes: web::Data<LikeRepository>,
) -> Result<HttpResponse, AppError> {
    let videos = likes.list_liked_videos(&user.user_id).await?;
    Ok(HttpResponse::Ok().json(videos))
}
