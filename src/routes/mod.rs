//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Sessions are created over HTTP and then joined over two WebSocket
//! endpoints: one for viewers, one for the renderer.

pub mod ws;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::services;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/session", post(create_session))
        .route("/api/session/{id}/view", get(ws::handle_view))
        .route("/api/session/{id}/render", get(ws::handle_render))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct SessionCreated {
    id: Uuid,
}

async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let id = services::session::create_session(&state).await;
    (StatusCode::CREATED, Json(SessionCreated { id }))
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
