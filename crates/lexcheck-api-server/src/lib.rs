pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

pub use state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.settings.server.max_body_mb * 1024 * 1024;

    // Public routes
    let health_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/ready", get(handlers::health::readiness_check));

    let api_routes = Router::new()
        .route("/api/documents", post(handlers::documents::upload_handler))
        .route(
            "/api/workspaces/{id}",
            get(handlers::documents::get_workspace).delete(handlers::documents::delete_workspace),
        )
        .route(
            "/api/workspaces/{id}/analyze",
            post(handlers::analysis::analyze_handler),
        )
        .route("/api/forms/guide", post(handlers::forms::form_guide_handler))
        .route(
            "/api/assistant/sessions",
            post(handlers::assistant::start_session),
        )
        .route(
            "/api/assistant/sessions/{id}/messages",
            post(handlers::assistant::send_message),
        )
        .route(
            "/api/history",
            get(handlers::history::list_history).delete(handlers::history::clear_history),
        )
        .route("/api/history/{id}", get(handlers::history::get_history))
        .route("/api/api-key/verify", post(handlers::api_key::verify_api_key))
        .route("/api/models", get(handlers::api_key::list_models));

    Router::new()
        .merge(health_routes)
        .merge(api_routes)
        .with_state(state)
        .layer(CatchPanicLayer::new())
        // CORS
        .layer(CorsLayer::permissive())
        // Tracing
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false)),
        )
        // Body limit (multi-file uploads)
        .layer(DefaultBodyLimit::max(body_limit))
}
