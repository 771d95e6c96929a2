use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::repositories::{CommentRepository, VideoRepository};
use crate::error::AppError;
use crate::models::AuthenticatedUser;
use crate::utils::pagination::PageQuery;

#[derive(Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

/// POST /comments/video/{videoId}
pub async fn add_comment(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    payload: web::Json<CommentRequest>,
    comments: web::Data<CommentRepository>,
    videos: web::Data<VideoRepository>,
) -> Result<HttpResponse, AppError> {
    if payload.content.trim().is_empty() {
        return Err(AppError::Validation("Comment content is required".to_string()));
    }

    let video_id = path.into_inner();
    // The comment must attach to an existing video.
    let video = videos.get_by_id(&video_id).await?;

    let comment = comments
        .create(&video.id, &user.user_id, payload.content.trim())
        .await?;

    Ok(HttpResponse::Created().json(comment))
}

/// GET /comments/video/{videoId}
pub async fn list_video_comments(
    path: web::Path<Uuid>,
    query: web::Query<PageQuery>,
    comments: web::Data<CommentRepository>,
) -> Result<HttpResponse, AppError> {
    let page = comments
        .list_by_video(&path.into_inner(), query.offset(), query.limit())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

/// PATCH /comments/{commentId} — ownership-gated.
pub async fn update_comment(
    path: web::Path<Uuid>,
    payload: web::Json<CommentRequest>,
    comments: web::Data<CommentRepository>,
) -> Result<HttpResponse, AppError> {
    if payload.content.trim().is_empty() {
        return Err(AppError::Validation("Comment content is required".to_string()));
    }

    let comment = comments
        .update_content(&path.into_inner(), payload.content.trim())
        .await?;
    Ok(HttpResponse::Ok().json(comment))
}

/// DELETE /comments/{commentId} — ownership-gated.
pub async fn delete_comment(
    path: web::Path<Uuid>,
    comments: web::Data<CommentRepository>,
) -> Result<HttpResponse, AppError> {
    comments.delete(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Comment deleted" })))
}
