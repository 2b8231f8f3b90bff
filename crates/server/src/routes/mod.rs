use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::AppState;

pub mod auth;
pub mod chat;
pub mod gallery;
pub mod health;
pub mod knowledge_base;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(auth::router(&state))
        .merge(chat::router(&state))
        .merge(gallery::router(&state))
        .merge(knowledge_base::router(&state));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(&state.upload_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
