use std::env;
use crate::error::AppError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppSettings {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub environment: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Signing secret for access tokens. Distinct from the refresh secret so
    /// that compromise of one class cannot forge the other.
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    /// Deadline for any single session-store call, in milliseconds.
    pub store_timeout_ms: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MediaConfig {
    pub upload_url: String,
    pub api_key: String,
}

impl AppSettings {
    pub fn from_env() -> Result<Self, AppError> {
        // App config
        let app_name = env::var("APP_NAME").unwrap_or_else(|_| "videotube".to_string());
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        // Database config
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Configuration("DATABASE_URL must be set".to_string()))?;

        // Server config
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| AppError::Configuration("SERVER_PORT must be a valid port number".to_string()))?;

        // CORS origins
        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        // Auth config
        let access_token_secret = env::var("ACCESS_TOKEN_SECRET")
            .map_err(|_| AppError::Configuration("ACCESS_TOKEN_SECRET must be set".to_string()))?;

        let refresh_token_secret = env::var("REFRESH_TOKEN_SECRET")
            .map_err(|_| AppError::Configuration("REFRESH_TOKEN_SECRET must be set".to_string()))?;

        if access_token_secret == refresh_token_secret {
            return Err(AppError::Configuration(
                "ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ".to_string(),
            ));
        }

        let access_token_ttl_minutes = env::var("ACCESS_TOKEN_TTL_MINUTES")
            .unwrap_or_else(|_| "15".to_string())
            .parse::<i64>()
            .map_err(|_| AppError::Configuration("ACCESS_TOKEN_TTL_MINUTES must be a valid number".to_string()))?;

        let refresh_token_ttl_days = env::var("REFRESH_TOKEN_TTL_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse::<i64>()
            .map_err(|_| AppError::Configuration("REFRESH_TOKEN_TTL_DAYS must be a valid number".to_string()))?;

        let store_timeout_ms = env::var("SESSION_STORE_TIMEOUT_MS")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u64>()
            .map_err(|_| AppError::Configuration("SESSION_STORE_TIMEOUT_MS must be a valid number".to_string()))?;

        // Media hosting service
        let media_upload_url = env::var("MEDIA_UPLOAD_URL")
            .map_err(|_| AppError::Configuration("MEDIA_UPLOAD_URL must be set".to_string()))?;

        let media_api_key = env::var("MEDIA_API_KEY")
            .map_err(|_| AppError::Configuration("MEDIA_API_KEY must be set".to_string()))?;

        Ok(Self {
            app: AppConfig {
                name: app_name,
                environment,
            },
            database: DatabaseConfig {
                url: database_url,
            },
            server: ServerConfig {
                host: server_host,
                port: server_port,
                cors_origins,
            },
            auth: AuthConfig {
                access_token_secret,
                refresh_token_secret,
                access_token_ttl_minutes,
                refresh_token_ttl_days,
                store_timeout_ms,
            },
            media: MediaConfig {
                upload_url: media_upload_url,
                api_key: media_api_key,
            },
        })
    }
}
