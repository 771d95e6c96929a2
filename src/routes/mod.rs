use actix_web::{guard, web};
use sqlx::PgPool;
use std::sync::Arc;

use crate::db::repositories::{OwnedResource, ResourceOwnership, UserRepository};
use crate::handlers::{
    comment_handlers, dashboard_handlers, health, like_handlers, playlist_handlers,
    subscription_handlers, tweet_handlers, user_handlers, video_handlers,
};
use crate::middleware::{AuthenticationGate, OwnershipGate};

/// The composable guards, constructed once from the pool and cloned into the
/// route tree. The authentication gate always wraps outside the ownership
/// gate, so both run, in order, before any handler.
#[derive(Clone)]
pub struct RouteGates {
    pub auth: AuthenticationGate,
    pub video_owner: OwnershipGate,
    pub comment_owner: OwnershipGate,
    pub tweet_owner: OwnershipGate,
    pub playlist_owner: OwnershipGate,
}

impl RouteGates {
    pub fn new(db_pool: &PgPool) -> Self {
        let owner_gate = |resource: OwnedResource| {
            OwnershipGate::new(
                resource.path_param(),
                Arc::new(ResourceOwnership::new(db_pool.clone(), resource)),
            )
        };

        Self {
            auth: AuthenticationGate::new(Arc::new(UserRepository::new(db_pool.clone()))),
            video_owner: owner_gate(OwnedResource::Video),
            comment_owner: owner_gate(OwnedResource::Comment),
            tweet_owner: owner_gate(OwnedResource::Tweet),
            playlist_owner: owner_gate(OwnedResource::Playlist),
        }
    }
}

// Configure all /api/v1 routes. Resources sharing a path but differing in
// protection carry method guards so the scope router picks the right one.
pub fn configure_api(cfg: &mut web::ServiceConfig, gates: &RouteGates) {
    cfg.route("/healthcheck", web::get().to(health::health_check));

    // User and session routes (/api/v1/users/*)
    cfg.service(
        web::scope("/users")
            .route("/register", web::post().to(user_handlers::register))
            .route("/login", web::post().to(user_handlers::login))
            .route("/refresh-token", web::post().to(user_handlers::refresh_token))
            .service(
                web::scope("")
                    .wrap(gates.auth.clone())
                    .route("/logout", web::post().to(user_handlers::logout))
                    .route("/change-password", web::patch().to(user_handlers::change_password))
                    .route("/me", web::get().to(user_handlers::current_user))
                    .route("/account", web::patch().to(user_handlers::update_account))
                    .route("/avatar", web::patch().to(user_handlers::update_avatar))
                    .route("/cover-image", web::patch().to(user_handlers::update_cover_image))
                    .route("/channel/{username}", web::get().to(user_handlers::channel_profile)),
            ),
    );

    // Video routes (/api/v1/videos/*)
    cfg.service(
        web::scope("/videos")
            .service(
                web::resource("")
                    .guard(guard::Get())
                    .route(web::get().to(video_handlers::list_videos)),
            )
            .service(
                web::resource("")
                    .wrap(gates.auth.clone())
                    .route(web::post().to(video_handlers::upload_video)),
            )
            .service(
                web::resource("/{videoId}")
                    .guard(guard::Get())
                    .route(web::get().to(video_handlers::get_video)),
            )
            .service(
                web::resource("/{videoId}")
                    .wrap(gates.video_owner.clone())
                    .wrap(gates.auth.clone())
                    .route(web::patch().to(video_handlers::update_video))
                    .route(web::delete().to(video_handlers::delete_video)),
            )
            .service(
                web::resource("/{videoId}/toggle-publish")
                    .wrap(gates.video_owner.clone())
                    .wrap(gates.auth.clone())
                    .route(web::patch().to(video_handlers::toggle_publish)),
            ),
    );

    // Comment routes (/api/v1/comments/*)
    cfg.service(
        web::scope("/comments")
            .service(
                web::resource("/video/{videoId}")
                    .guard(guard::Get())
                    .route(web::get().to(comment_handlers::list_video_comments)),
            )
            .service(
                web::resource("/video/{videoId}")
                    .wrap(gates.auth.clone())
                    .route(web::post().to(comment_handlers::add_comment)),
            )
            .service(
                web::resource("/{commentId}")
                    .wrap(gates.comment_owner.clone())
                    .wrap(gates.auth.clone())
                    .route(web::patch().to(comment_handlers::update_comment))
                    .route(web::delete().to(comment_handlers::delete_comment)),
            ),
    );

    // Tweet routes (/api/v1/tweets/*), all authenticated
    cfg.service(
        web::scope("/tweets")
            .wrap(gates.auth.clone())
            .route("", web::post().to(tweet_handlers::create_tweet))
            .route("/user/{userId}", web::get().to(tweet_handlers::list_user_tweets))
            .service(
                web::resource("/{tweetId}")
                    .wrap(gates.tweet_owner.clone())
                    .route(web::patch().to(tweet_handlers::update_tweet))
                    .route(web::delete().to(tweet_handlers::delete_tweet)),
            ),
    );

    // Like routes (/api/v1/likes/*), all authenticated
    cfg.service(
        web::scope("/likes")
            .wrap(gates.auth.clone())
            .route("/toggle/v/{videoId}", web::patch().to(like_handlers::toggle_video_like))
            .route("/toggle/c/{commentId}", web::patch().to(like_handlers::toggle_comment_like))
            .route("/toggle/t/{tweetId}", web::patch().to(like_handlers::toggle_tweet_like))
            .route("/videos", web::get().to(like_handlers::list_liked_videos)),
    );

    // Subscription routes (/api/v1/subscriptions/*), all authenticated
    cfg.service(
        web::scope("/subscriptions")
            .wrap(gates.auth.clone())
            .service(
                web::resource("/c/{channelId}")
                    .route(web::patch().to(subscription_handlers::toggle_subscription))
                    .route(web::get().to(subscription_handlers::list_subscribers)),
            )
            .route(
                "/u/{subscriberId}",
                web::get().to(subscription_handlers::list_subscribed_channels),
            ),
    );

    // Playlist routes (/api/v1/playlists/*), all authenticated
    cfg.service(
        web::scope("/playlists")
            .wrap(gates.auth.clone())
            .route("", web::post().to(playlist_handlers::create_playlist))
            .route("/user/{userId}", web::get().to(playlist_handlers::list_user_playlists))
            .service(
                web::resource("/{playlistId}")
                    .guard(guard::Get())
                    .route(web::get().to(playlist_handlers::get_playlist)),
            )
            .service(
                web::resource("/{playlistId}")
                    .wrap(gates.playlist_owner.clone())
                    .route(web::patch().to(playlist_handlers::update_playlist))
                    .route(web::delete().to(playlist_handlers::delete_playlist)),
            )
            .service(
                web::resource("/{playlistId}/videos/{videoId}")
                    .wrap(gates.playlist_owner.clone())
                    .route(web::patch().to(playlist_handlers::add_video_to_playlist))
                    .route(web::delete().to(playlist_handlers::remove_video_from_playlist)),
            ),
    );

    // Dashboard routes (/api/v1/dashboard/*), all authenticated
    cfg.service(
        web::scope("/dashboard")
            .wrap(gates.auth.clone())
            .route("/stats", web::get().to(dashboard_handlers::channel_stats))
            .route("/videos", web::get().to(dashboard_handlers::channel_videos)),
    );
}
