use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use log::{info, warn};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::repositories::VideoRepository;
use crate::error::AppError;
use crate::models::AuthenticatedUser;
use crate::services::media::MediaClient;
use crate::utils::multipart::read_form;
use crate::utils::pagination::PageQuery;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// POST /videos — multipart form with `video` (required) and `thumbnail`
/// (optional) files plus `title`/`description` text fields. The file is
/// forwarded to the media-hosting service; only the hosted URLs are stored.
pub async fn upload_video(
    user: AuthenticatedUser,
    payload: Multipart,
    videos: web::Data<VideoRepository>,
    media: web::Data<MediaClient>,
) -> Result<HttpResponse, AppError> {
    let mut form = read_form(payload).await?;

    let title = form.require_text("title")?.to_string();
    let description = form.text("description").map(|s| s.to_string());

    let video_file = form
        .take_file("video")
        .ok_or_else(|| AppError::Validation("Video file is missing".to_string()))?;

    let video_asset = media.upload(&video_file.file_name, video_file.bytes).await?;

    let thumbnail_url = match form.take_file("thumbnail") {
        Some(file) => Some(media.upload(&file.file_name, file.bytes).await?.url),
        None => None,
    };

    let video = videos
        .create(
            &user.user_id,
            &title,
            description.as_deref(),
            &video_asset.url,
            &video_asset.public_id,
            thumbnail_url.as_deref(),
            video_asset.duration.unwrap_or(0.0),
        )
        .await?;

    info!("video_uploaded: id={}, owner={}", video.id, user.user_id);
    Ok(HttpResponse::Created().json(video))
}

/// GET /videos — newest-first page of published videos.
pub async fn list_videos(
    query: web::Query<PageQuery>,
    videos: web::Data<VideoRepository>,
) -> Result<HttpResponse, AppError> {
    let page = videos.list_published(query.offset(), query.limit()).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /videos/{videoId} — fetching a video counts a view.
pub async fn get_video(
    path: web::Path<Uuid>,
    videos: web::Data<VideoRepository>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let video = videos.get_by_id(&id).await?;
    videos.increment_views(&id).await?;
    Ok(HttpResponse::Ok().json(video))
}

/// PATCH /videos/{videoId} — ownership-gated.
pub async fn update_video(
    path: web::Path<Uuid>,
    payload: web::Json<UpdateVideoRequest>,
    videos: web::Data<VideoRepository>,
) -> Result<HttpResponse, AppError> {
    if payload.title.is_none() && payload.description.is_none() {
        return Err(AppError::Validation("Nothing to update".to_string()));
    }

    let video = videos
        .update_details(
            &path.into_inner(),
            payload.title.as_deref(),
            payload.description.as_deref(),
            None,
        )
        .await?;

    Ok(HttpResponse::Ok().json(video))
}

/// PATCH /videos/{videoId}/toggle-publish — ownership-gated.
pub async fn toggle_publish(
    path: web::Path<Uuid>,
    videos: web::Data<VideoRepository>,
) -> Result<HttpResponse, AppError> {
    let video = videos.toggle_publish(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(video))
}

/// DELETE /videos/{videoId} — ownership-gated. The hosted file is removed
/// best-effort after the record.
pub async fn delete_video(
    path: web::Path<Uuid>,
    videos: web::Data<VideoRepository>,
    media: web::Data<MediaClient>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let video = videos.get_by_id(&id).await?;
    videos.delete(&id).await?;

    if let Err(e) = media.delete(&video.video_public_id).await {
        warn!("media_delete_failed: video={}, error={}", id, e);
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Video deleted" })))
}
