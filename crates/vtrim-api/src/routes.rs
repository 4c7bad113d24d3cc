//! API routes.

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::sessions::{
    cancel_detection, confirm_detection, create_session, delete_session, detect,
    discard_transcription, export, filter, get_session, select_file, transcribe, update_segments,
};
use crate::handlers::{health, ready};
use crate::state::AppState;
use crate::ws::ws_progress;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let session_routes = Router::new()
        .route("/sessions", post(create_session))
        .route(
            "/sessions/:session_id",
            get(get_session).delete(delete_session),
        )
        .route("/sessions/:session_id/file", post(select_file))
        .route("/sessions/:session_id/detect", post(detect))
        .route("/sessions/:session_id/detect/confirm", post(confirm_detection))
        .route("/sessions/:session_id/detect/cancel", post(cancel_detection))
        .route("/sessions/:session_id/transcribe", post(transcribe))
        .route("/sessions/:session_id/filter", post(filter))
        .route(
            "/sessions/:session_id/discard-transcription",
            post(discard_transcription),
        )
        .route("/sessions/:session_id/segments", put(update_segments))
        .route("/sessions/:session_id/export", get(export));

    let ws_routes = Router::new().route("/ws/sessions/:session_id/progress", get(ws_progress));

    let max_body_size = state.config.max_body_size;
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .nest("/api", session_routes)
        .merge(ws_routes)
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer.allow_origin(parsed)
    }
}
