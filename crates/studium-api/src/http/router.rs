//! Axum router configuration with middleware.
//!
//! All API routes are under `/api/v1/`.
//! Middleware: CORS, tracing.
//!
//! Stored attachments are served statically from the uploads directory at
//! `/uploads/` so the reference paths handed out by the store resolve.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Multipart body cap: the 10 MiB attachment limit plus form overhead.
/// The store enforces the real limit; this just keeps the framework from
/// rejecting valid uploads at its 2 MiB default.
const UPLOAD_BODY_LIMIT: usize = 12 * 1024 * 1024;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Sessions
        .route(
            "/sessions",
            get(handlers::session::list_sessions).post(handlers::session::create_session),
        )
        .route("/sessions/{id}", get(handlers::session::get_session))
        .route("/sessions/{id}", delete(handlers::session::delete_session))
        .route(
            "/sessions/{id}/messages",
            post(handlers::session::add_message),
        )
        // File handling
        .route("/uploads", post(handlers::upload::upload_file))
        .route(
            "/transcriptions",
            post(handlers::transcription::transcribe_audio),
        )
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT));

    let uploads_service = ServeDir::new(&state.uploads_dir);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .nest_service("/uploads", uploads_service)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
