use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::repositories::{PlaylistRepository, VideoRepository};
use crate::error::AppError;
use crate::models::AuthenticatedUser;

#[derive(Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdatePlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// POST /playlists
pub async fn create_playlist(
    user: AuthenticatedUser,
    payload: web::Json<CreatePlaylistRequest>,
    playlists: web::Data<PlaylistRepository>,
) -> Result<HttpResponse, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Playlist name is required".to_string()));
    }

    let playlist = playlists
        .create(
            &user.user_id,
            payload.name.trim(),
            payload.description.as_deref(),
        )
        .await?;
    Ok(HttpResponse::Created().json(playlist))
}

/// GET /playlists/user/{userId}
pub async fn list_user_playlists(
    path: web::Path<Uuid>,
    playlists: web::Data<PlaylistRepository>,
) -> Result<HttpResponse, AppError> {
    let list = playlists.list_by_owner(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(list))
}

/// GET /playlists/{playlistId} — playlist with its videos.
pub async fn get_playlist(
    path: web::Path<Uuid>,
    playlists: web::Data<PlaylistRepository>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let playlist = playlists.get_by_id(&id).await?;
    let videos = playlists.list_videos(&id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "playlist": playlist,
        "videos": videos,
    })))
}

/// PATCH /playlists/{playlistId} — ownership-gated.
pub async fn update_playlist(
    path: web::Path<Uuid>,
    payload: web::Json<UpdatePlaylistRequest>,
    playlists: web::Data<PlaylistRepository>,
) -> Result<HttpResponse, AppError> {
    if payload.name.is_none() && payload.description.is_none() {
        return Err(AppError::Validation("Nothing to update".to_string()));
    }

    let playlist = playlists
        .update_details(
            &path.into_inner(),
            payload.name.as_deref(),
            payload.description.as_deref(),
        )
        .await?;
    Ok(HttpResponse::Ok().json(playlist))
}

/// DELETE /playlists/{playlistId} — ownership-gated.
pub async fn delete_playlist(
    path: web::Path<Uuid>,
    playlists: web::Data<PlaylistRepository>,
) -> Result<HttpResponse, AppError> {
    playlists.delete(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Playlist deleted" })))
}

/// PATCH /playlists/{playlistId}/videos/{videoId} — ownership-gated on the
/// playlist; the video only has to exist.
pub async fn add_video_to_playlist(
    path: web::Path<(Uuid, Uuid)>,
    playlists: web::Data<PlaylistRepository>,
    videos: web::Data<VideoRepository>,
) -> Result<HttpResponse, AppError> {
    let (playlist_id, video_id) = path.into_inner();
    let video = videos.get_by_id(&video_id).await?;

    playlists.add_video(&playlist_id, &video.id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Video added to playlist" })))
}

/// DELETE /playlists/{playlistId}/videos/{videoId} — ownership-gated on the
/// playlist.
pub async fn remove_video_from_playlist(
    path: web::Path<(Uuid, Uuid)>,
    playlists: web::Data<PlaylistRepository>,
) -> Result<HttpResponse, AppError> {
    let (playlist_id, video_id) = path.into_inner();
    playlists.remove_video(&playlist_id, &video_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Video removed from playlist" })))
}
