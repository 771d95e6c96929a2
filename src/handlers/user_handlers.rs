use actix_multipart::Multipart;
use actix_web::cookie::{time::Duration as CookieDuration, Cookie};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AppSettings;
use crate::db::repositories::{User, UserRepository};
use crate::error::AppError;
use crate::middleware::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::models::AuthenticatedUser;
use crate::security::password::{hash_password, verify_password};
use crate::services::auth::{SessionManager, TokenPair};
use crate::services::media::MediaClient;
use crate::utils::multipart::read_form;
use crate::utils::retry::with_single_retry;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Username or email
    pub identifier: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar_url: user.avatar_url,
            cover_image_url: user.cover_image_url,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Cookie flags are fixed across every issuance path: httpOnly and secure,
/// scoped to the whole site.
fn auth_cookie(name: &'static str, value: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .secure(true)
        .max_age(CookieDuration::seconds(max_age_secs))
        .finish()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build(name, "")
        .path("/")
        .http_only(true)
        .secure(true)
        .finish();
    cookie.make_removal();
    cookie
}

fn token_pair_cookies(
    pair: &TokenPair,
    settings: &AppSettings,
) -> (Cookie<'static>, Cookie<'static>) {
    (
        auth_cookie(
            ACCESS_TOKEN_COOKIE,
            pair.access_token.clone(),
            settings.auth.access_token_ttl_minutes * 60,
        ),
        auth_cookie(
            REFRESH_TOKEN_COOKIE,
            pair.refresh_token.clone(),
            settings.auth.refresh_token_ttl_days * 24 * 60 * 60,
        ),
    )
}

/// POST /users/register — multipart form with the account fields plus
/// optional avatar and cover image files.
pub async fn register(
    payload: Multipart,
    users: web::Data<UserRepository>,
    media: web::Data<MediaClient>,
) -> Result<HttpResponse, AppError> {
    let mut form = read_form(payload).await?;

    let username = form.require_text("username")?.to_lowercase();
    let email = form.require_text("email")?.to_lowercase();
    let password = form.require_text("password")?.to_string();
    let full_name = form.text("fullName").map(|s| s.to_string());

    if username.chars().any(char::is_whitespace) {
        return Err(AppError::Validation("Username must not contain whitespace".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::Validation("Email is not valid".to_string()));
    }
    if password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    if users.exists_with_username_or_email(&username, &email).await? {
        return Err(AppError::Conflict(
            "User with this email or username already exists".to_string(),
        ));
    }

    let avatar_url = match form.take_file("avatar") {
        Some(file) => Some(media.upload(&file.file_name, file.bytes).await?.url),
        None => None,
    };
    let cover_image_url = match form.take_file("coverImage") {
        Some(file) => Some(media.upload(&file.file_name, file.bytes).await?.url),
        None => None,
    };

    let password_hash = hash_password(&password)?;
    let user = users
        .create(
            &username,
            &email,
            &password_hash,
            full_name.as_deref(),
            avatar_url.as_deref(),
            cover_image_url.as_deref(),
        )
        .await?;

    info!("user_registered: id={}, username={}", user.id, user.username);
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// POST /users/login — credential check happens here; the session manager
/// only ever sees the resulting subject id. Tokens travel both as cookies and
/// in the body for non-cookie clients.
pub async fn login(
    payload: web::Json<LoginRequest>,
    users: web::Data<UserRepository>,
    sessions: web::Data<SessionManager>,
    settings: web::Data<AppSettings>,
) -> Result<HttpResponse, AppError> {
    if payload.identifier.trim().is_empty() {
        return Err(AppError::Validation("Username or email is required".to_string()));
    }

    let user = users
        .find_by_login_key(payload.identifier.trim())
        .await?
        .ok_or_else(|| AppError::Unauthenticated("Unknown login identifier".to_string()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::Unauthenticated(format!(
            "Wrong password for user {}",
            user.id
        )));
    }

    let pair = with_single_retry(|| sessions.login(user.id)).await?;
    let (access_cookie, refresh_cookie) = token_pair_cookies(&pair, &settings);

    info!("user_logged_in: id={}", user.id);
    Ok(HttpResponse::Ok()
        .cookie(access_cookie)
        .cookie(refresh_cookie)
        .json(LoginResponse {
            user: UserResponse::from(user),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }))
}

/// Ordered refresh-token extraction: cookie first, then request body. First
/// source present wins.
fn extract_refresh_token(req: &HttpRequest, body: Option<&RefreshRequest>) -> Option<String> {
    if let Some(cookie) = req.cookie(REFRESH_TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }
    body.and_then(|b| b.refresh_token.clone())
}

/// POST /users/refresh-token — rotates the refresh credential exactly once;
/// any failure is a generic 401.
pub async fn refresh_token(
    req: HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
    sessions: web::Data<SessionManager>,
    settings: web::Data<AppSettings>,
) -> Result<HttpResponse, AppError> {
    let presented = extract_refresh_token(&req, body.as_deref())
        .ok_or_else(|| AppError::Unauthenticated("No refresh token presented".to_string()))?;

    let pair = with_single_retry(|| sessions.refresh(&presented)).await?;
    let (access_cookie, refresh_cookie) = token_pair_cookies(&pair, &settings);

    Ok(HttpResponse::Ok()
        .cookie(access_cookie)
        .cookie(refresh_cookie)
        .json(TokenPairResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }))
}

/// POST /users/logout — clears the session record and both cookies.
pub async fn logout(
    user: AuthenticatedUser,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    with_single_retry(|| sessions.logout(user.user_id)).await?;

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie(ACCESS_TOKEN_COOKIE))
        .cookie(removal_cookie(REFRESH_TOKEN_COOKIE))
        .json(serde_json::json!({ "message": "Logged out successfully" })))
}

/// PATCH /users/change-password — a successful change invalidates the
/// session, forcing re-login on all devices.
pub async fn change_password(
    user: AuthenticatedUser,
    payload: web::Json<ChangePasswordRequest>,
    users: web::Data<UserRepository>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    if payload.new_password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let record = users.get_by_id(&user.user_id).await?;
    if !verify_password(&payload.old_password, &record.password_hash)? {
        return Err(AppError::BadRequest("Invalid old password".to_string()));
    }

    let new_hash = hash_password(&payload.new_password)?;
    users.update_password_hash(&user.user_id, &new_hash).await?;

    with_single_retry(|| sessions.invalidate_on_password_change(user.user_id)).await?;

    info!("password_changed: id={}", user.user_id);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Password changed successfully, please log in again"
    })))
}

/// GET /users/me
pub async fn current_user(
    user: AuthenticatedUser,
    users: web::Data<UserRepository>,
) -> Result<HttpResponse, AppError> {
    let record = users.get_by_id(&user.user_id).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(record)))
}

/// PATCH /users/account
pub async fn update_account(
    user: AuthenticatedUser,
    payload: web::Json<UpdateAccountRequest>,
    users: web::Data<UserRepository>,
) -> Result<HttpResponse, AppError> {
    if payload.full_name.is_none() && payload.email.is_none() {
        return Err(AppError::Validation("Nothing to update".to_string()));
    }
    if let Some(email) = &payload.email {
        if !email.contains('@') {
            return Err(AppError::Validation("Email is not valid".to_string()));
        }
    }

    let updated = users
        .update_profile(
            &user.user_id,
            payload.full_name.as_deref(),
            payload.email.as_deref(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(updated)))
}

/// PATCH /users/avatar — multipart with a single `avatar` file.
pub async fn update_avatar(
    user: AuthenticatedUser,
    payload: Multipart,
    users: web::Data<UserRepository>,
    media: web::Data<MediaClient>,
) -> Result<HttpResponse, AppError> {
    let mut form = read_form(payload).await?;
    let file = form
        .take_file("avatar")
        .ok_or_else(|| AppError::Validation("Avatar file is missing".to_string()))?;

    let asset = media.upload(&file.file_name, file.bytes).await?;
    users.update_avatar(&user.user_id, &asset.url).await?;

    let record = users.get_by_id(&user.user_id).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(record)))
}

/// PATCH /users/cover-image — multipart with a single `coverImage` file.
pub async fn update_cover_image(
    user: AuthenticatedUser,
    payload: Multipart,
    users: web::Data<UserRepository>,
    media: web::Data<MediaClient>,
) -> Result<HttpResponse, AppError> {
    let mut form = read_form(payload).await?;
    let file = form
        .take_file("coverImage")
        .ok_or_else(|| AppError::Validation("Cover image file is missing".to_string()))?;

    let asset = media.upload(&file.file_name, file.bytes).await?;
    users.update_cover_image(&user.user_id, &asset.url).await?;

    let record = users.get_by_id(&user.user_id).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(record)))
}

/// GET /users/channel/{username} — public channel view with subscription
/// aggregates as seen by the caller.
pub async fn channel_profile(
    user: AuthenticatedUser,
    path: web::Path<String>,
    users: web::Data<UserRepository>,
) -> Result<HttpResponse, AppError> {
    let username = path.into_inner();
    if username.trim().is_empty() {
        return Err(AppError::Validation("Username is missing".to_string()));
    }

    let profile = users
        .get_channel_profile(&username, Some(&user.user_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Channel {} does not exist", username)))?;

    Ok(HttpResponse::Ok().json(profile))
}
