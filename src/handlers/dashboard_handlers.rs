use actix_web::{web, HttpResponse};

use crate::db::repositories::{DashboardRepository, VideoRepository};
use crate::error::AppError;
use crate::models::AuthenticatedUser;

/// GET /dashboard/stats — aggregates for the caller's own channel.
pub async fn channel_stats(
    user: AuthenticatedUser,
    dashboard: web::Data<DashboardRepository>,
) -> Result<HttpResponse, AppError> {
    let stats = dashboard.channel_stats(&user.user_id).await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// GET /dashboard/videos — all of the caller's videos, published or not.
pub async fn channel_videos(
    user: AuthenticatedUser,
    videos: web::Data<VideoRepository>,
) -> Result<HttpResponse, AppError> {
    let list = videos.list_by_owner(&user.user_id).await?;
    Ok(HttpResponse::Ok().json(list))
}
