mod api;
mod bus;
mod config;
mod db;
mod feed;
mod media;
mod password;
mod profile;
mod rate_limit;
mod session;
mod state;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use rate_limit::RateLimiter;
use state::{AppState, BusConfig, MediaConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sirius_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load settings
    let settings = config::Settings::new().expect("Failed to load settings");

    // Initialize database
    let db = db::Database::new(&settings.database.path).expect("Failed to create database");

    db.initialize()
        .expect("Failed to initialize database schema");

    db.seed_services()
        .expect("Failed to seed the services directory");

    tracing::info!("Database initialized successfully");

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to build HTTP client");

    let media_dir = PathBuf::from(&settings.media.dir);
    std::fs::create_dir_all(&media_dir).expect("Failed to create media directory");

    // Create application state
    let state = AppState::new(
        db,
        http.clone(),
        BusConfig {
            upstream_url: settings.bus.upstream_url.clone(),
            snapshot_path: PathBuf::from(&settings.bus.snapshot_path),
        },
        MediaConfig {
            dir: media_dir.clone(),
            public_base_url: settings.media.public_base_url.clone(),
            max_upload_bytes: settings.media.max_upload_bytes,
        },
    );

    // Run initial session cleanup on startup
    match state.session_manager.cleanup_expired_sessions() {
        Ok(count) if count > 0 => {
            tracing::info!("Cleaned up {} expired sessions on startup", count);
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!("Failed to cleanup expired sessions on startup: {}", e);
        }
    }

    // Start background task for periodic session cleanup
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match cleanup_state.session_manager.cleanup_expired_sessions() {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!("Periodic cleanup: removed {} expired sessions", count);
                    }
                }
                Err(e) => {
                    tracing::error!("Periodic session cleanup failed: {}", e);
                }
            }
        }
    });

    // Start the bus tracker polling loop
    tokio::spawn(state.bus_tracker.clone().run(
        http,
        settings.bus.upstream_url.clone(),
        PathBuf::from(&settings.bus.snapshot_path),
        Duration::from_secs(settings.bus.poll_interval_secs),
    ));

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Global rate limiter: 100 requests per minute per session
    let rate_limiter = RateLimiter::new(100, 60);

    // Build router
    let app = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Authentication routes
        .route("/auth/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/logout", post(api::auth::logout))
        .route("/auth/me", get(api::auth::me))
        .route("/auth/password", put(api::auth::update_password))
        .route("/users/me/profile", put(api::auth::update_profile))
        // Feed and post routes
        .route("/feed", get(api::feed::get_feed))
        .route("/posts", post(api::posts::create_post))
        .route("/posts/:id", delete(api::posts::delete_post))
        .route("/posts/:id/like", post(api::posts::toggle_like))
        .route("/posts/:id/media", post(api::posts::upload_media))
        .route("/posts/:id/comments", post(api::comments::create_comment))
        .route("/posts/:id/comments", get(api::comments::get_comments))
        // Profile resolution
        .route("/api/user-profiles", post(api::profiles::resolve_profiles))
        // Bus tracking
        .route("/api/bus-locations", get(api::bus::get_locations))
        .route("/api/bus-locations/positions", get(api::bus::get_positions))
        // Services directory
        .route("/services", get(api::services::get_services))
        // Uploaded media files
        .nest_service("/media", ServeDir::new(media_dir))
        // Leave room for multipart framing around the per-file cap
        .layer(axum::extract::DefaultBodyLimit::max(
            settings.media.max_upload_bytes as usize + 64 * 1024,
        ))
        .with_state(state)
        .layer(middleware::from_fn(rate_limit::rate_limit_middleware))
        .layer(axum::Extension(rate_limiter))
        .layer(cors);

    // Start server
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .expect("Failed to parse server address");
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app).await.expect("Server error");
}

async fn health_check() -> &'static str {
    "OK"
}
