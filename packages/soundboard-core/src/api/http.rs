//! HTTP route handlers.
//!
//! All handlers are thin: they read from the shared services and never
//! mutate playback. Control goes through the WebSocket session.

use axum::{
    extract::{Path, State},
    http::{header, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::ws::ws_handler;
use crate::api::AppState;
use crate::catalog::Asset;
use crate::error::{SoundboardError, SoundboardResult};
use crate::playback::PlaybackState;
use crate::protocol_constants::SERVICE_ID;
use crate::state::OutputFormat;

// ─────────────────────────────────────────────────────────────────────────────
// Response Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogResponse {
    path: String,
    sound_files: Vec<Asset>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StateResponse {
    #[serde(flatten)]
    playback: PlaybackState,
    active_sounds: Vec<usize>,
    clients: usize,
    output: &'static str,
    format: OutputFormat,
}

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Creates the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let web_root = state.config.web_root.clone();

    let router = Router::new()
        .route("/health", get(health_check))
        .route("/api/catalog", get(get_catalog))
        .route("/api/catalog/{id}", get(get_asset))
        .route("/api/state", get(get_state))
        .route("/control", get(ws_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let router = match web_root {
        Some(root) => {
            log::info!("[HTTP] Serving front-end from {}", root.display());
            router.fallback_service(ServeDir::new(root))
        }
        None => router,
    };

    router.layer(cors).layer(TraceLayer::new_for_http())
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Liveness probe.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": SERVICE_ID,
        "sounds": state.catalog.len(),
    }))
}

/// Current catalog snapshot.
async fn get_catalog(State(state): State<AppState>) -> impl IntoResponse {
    Json(CatalogResponse {
        path: state.catalog.root().display().to_string(),
        sound_files: state.catalog.snapshot().to_vec(),
    })
}

async fn get_asset(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> SoundboardResult<Json<Asset>> {
    state
        .catalog
        .get(id)
        .map(Json)
        .ok_or(SoundboardError::AssetNotFound(id))
}

/// Playback state plus connected client count.
async fn get_state(State(state): State<AppState>) -> impl IntoResponse {
    Json(StateResponse {
        playback: state.playback.current_state(),
        active_sounds: state.playback.active_assets(),
        clients: state.hub.client_count(),
        output: state.playback.output_name(),
        format: state.playback.format(),
    })
}
