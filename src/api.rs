//! Embedded HTTP API: status flags and edge-triggered operation dispatch.

use crate::coordinator::StatusFlags;
use crate::settings::{keys, SettingsStore};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tokio::sync::mpsc::Sender;

struct ApiState {
    status: StatusFlags,
    settings: Arc<dyn SettingsStore>,
    refresh_tx: Sender<()>,
    configure_tx: Sender<()>,
}

pub async fn start_api_server(
    status: StatusFlags,
    settings: Arc<dyn SettingsStore>,
    refresh_tx: Sender<()>,
    configure_tx: Sender<()>,
    port: u16,
) {
    let state = Arc::new(ApiState {
        status,
        settings,
        refresh_tx,
        configure_tx,
    });

    let app = Router::new()
        .route("/api/status", get(get_status))
        .route("/api/settings", get(get_settings))
        .route("/api/refresh", post(trigger_refresh))
        .route("/api/configure", post(trigger_configure))
        .with_state(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("API Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn get_status(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "downloading": state.status.downloading(),
        "configuring": state.status.configuring(),
    }))
}

async fn get_settings(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let mut snapshot = serde_json::Map::new();
    for key in [
        keys::BLOCKLIST_URLS,
        keys::WHITELIST,
        keys::BLACKLIST,
        keys::UPDATE_INTERVAL,
        keys::ENABLED,
        keys::DHCP_ENABLED,
        keys::IPV6_ENABLED,
        keys::DEFAULT_GATEWAY,
        keys::DNS_SERVER,
        keys::IP_RANGE_START,
        keys::IP_RANGE_END,
    ] {
        if let Some(value) = state.settings.get(key).await {
            if let Ok(json) = serde_json::to_value(&value) {
                snapshot.insert(key.to_string(), json);
            }
        }
    }
    Json(serde_json::Value::Object(snapshot))
}

/// Edge-triggered: dispatch and return immediately. A trigger while the
/// operation is already queued or running is dropped.
async fn trigger_refresh(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    match state.refresh_tx.try_send(()) {
        Ok(()) => Json(serde_json::json!({ "status": "refresh_triggered" })).into_response(),
        Err(_) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "status": "refresh_already_pending" })),
        )
            .into_response(),
    }
}

async fn trigger_configure(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    match state.configure_tx.try_send(()) {
        Ok(()) => Json(serde_json::json!({ "status": "configure_triggered" })).into_response(),
        Err(_) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "status": "configure_already_pending" })),
        )
            .into_response(),
    }
}
