use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use super::{approve, handlers, middleware::metrics_middleware, pipeline, records};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Stored audio and video, linked from approval emails
    let assets = ServeDir::new(&state.config().storage.root);

    // Any origin may call the API
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        // Stage triggers
        .route("/collect", post(pipeline::collect))
        .route("/generate-script", post(pipeline::generate_script))
        .route("/stats", get(pipeline::stats))
        .route("/generate", post(pipeline::generate_audio))
        .route("/edit-video", post(pipeline::edit_video))
        .route("/send-approval", post(pipeline::send_approval))
        .route("/approve", get(approve::approve))
        .route("/upload", post(pipeline::upload))
        // Records
        .route("/topics", get(records::list_topics))
        .route("/scripts", get(records::list_scripts))
        .route("/scripts/{id}", get(records::get_script))
        .nest_service("/assets", assets)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
