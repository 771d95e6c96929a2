use actix_web::{middleware::Logger, web, App, HttpServer};
use actix_cors::Cors;
use dotenv::dotenv;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod routes;
mod security;
mod services;
mod utils;

use crate::config::AppSettings;
use crate::db::connection::{create_pool, verify_connection};
use crate::db::repositories::{
    CommentRepository, DashboardRepository, LikeRepository, PgSessionStore, PlaylistRepository,
    SubscriptionRepository, TweetRepository, UserRepository, VideoRepository,
};
use crate::routes::{configure_api, RouteGates};
use crate::services::auth::{tokens, SessionManager};
use crate::services::media::MediaClient;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Load application settings
    let app_settings = match AppSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Failed to load application settings: {}", e);
            log::error!("Cannot start server without valid settings");
            std::process::exit(1);
        }
    };

    // Initialize token signing keys
    if let Err(e) = tokens::init_token_keys(&app_settings.auth) {
        log::error!("Failed to initialize token keys: {}", e);
        log::error!("Cannot start server without working token keys");
        std::process::exit(1);
    }
    log::info!("Token keys initialized successfully");

    // Database connection setup
    let db_pool = match create_pool(&app_settings.database.url).await {
        Ok(pool) => {
            if let Err(e) = verify_connection(&pool).await {
                log::error!("Database connection verification failed: {}", e);
                log::error!("Cannot start server without a working database connection");
                std::process::exit(1);
            }
            log::info!("Database connection established successfully");
            pool
        }
        Err(e) => {
            log::error!("Failed to create database connection pool: {}", e);
            log::error!("Cannot start server without a working database connection");
            std::process::exit(1);
        }
    };

    // Media hosting client
    let media_client = match MediaClient::new(&app_settings.media) {
        Ok(client) => client,
        Err(e) => {
            log::error!("Failed to initialize media client: {}", e);
            std::process::exit(1);
        }
    };

    // Session manager over the Postgres-backed session store
    let session_manager = SessionManager::new(
        Arc::new(PgSessionStore::new(db_pool.clone())),
        Duration::from_millis(app_settings.auth.store_timeout_ms),
    );

    let host = app_settings.server.host.clone();
    let port = app_settings.server.port;

    log::info!("Starting server at http://{}:{}", host, port);

    let server_addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(server_addr)?;

    HttpServer::new(move || {
        let db_pool = db_pool.clone();
        let app_settings = app_settings.clone();
        let gates = RouteGates::new(&db_pool);

        // Configure CORS using actix-cors
        let mut cors = Cors::default().supports_credentials();
        if app_settings.server.cors_origins.contains(&"*".to_string()) {
            cors = cors.allow_any_origin();
        } else {
            for origin in &app_settings.server.cors_origins {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(app_settings.clone()))
            .app_data(web::Data::new(session_manager.clone()))
            .app_data(web::Data::new(media_client.clone()))
            .app_data(web::Data::new(UserRepository::new(db_pool.clone())))
            .app_data(web::Data::new(VideoRepository::new(db_pool.clone())))
            .app_data(web::Data::new(CommentRepository::new(db_pool.clone())))
            .app_data(web::Data::new(TweetRepository::new(db_pool.clone())))
            .app_data(web::Data::new(LikeRepository::new(db_pool.clone())))
            .app_data(web::Data::new(SubscriptionRepository::new(db_pool.clone())))
            .app_data(web::Data::new(PlaylistRepository::new(db_pool.clone())))
            .app_data(web::Data::new(DashboardRepository::new(db_pool.clone())))
            .service(web::scope("/api/v1").configure(|cfg| configure_api(cfg, &gates)))
    })
    .listen(listener)?
    .run()
    .await
}
