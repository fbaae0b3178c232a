//! HTTP surface: player registration, the browser client page, and the
//! WebSocket endpoint that hands accepted connections to the session runner.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::game::player::Pose;
use crate::net::host::WorldHost;
use crate::net::session;
use crate::services::directory::{DirectoryError, PlayerDirectory};
use crate::services::state_client::PlayerStateClient;

/// Heading assigned when no persisted pose is usable.
const DEFAULT_HEADING: f32 = 4.71;
/// Last-resort spawn when the map has no free cell either.
const FALLBACK_SPAWN: (f32, f32) = (3.5, 3.5);

#[derive(Clone)]
pub struct AppState {
    pub host: Arc<WorldHost>,
    pub directory: Arc<PlayerDirectory>,
    pub state_client: Arc<PlayerStateClient>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/players/register", post(register))
        .route("/players/login", post(login))
        .route("/ws", get(ws_upgrade))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../../assets/index.html"))
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    nickname: String,
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Response {
    match state.directory.register(&payload.nickname) {
        Ok(_) => (StatusCode::OK, Json(json!({}))).into_response(),
        Err(DirectoryError::EmptyNickname) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Nickname is required" })),
        )
            .into_response(),
        Err(DirectoryError::Duplicate) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "Nickname already exists" })),
        )
            .into_response(),
    }
}

async fn login(State(state): State<AppState>, Json(payload): Json<RegisterRequest>) -> Response {
    match state.directory.register(&payload.nickname) {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "message": "Player created" })),
        )
            .into_response(),
        Err(DirectoryError::EmptyNickname) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Nickname is required" })),
        )
            .into_response(),
        Err(DirectoryError::Duplicate) => (
            StatusCode::CONFLICT,
            Json(json!({ "message": "Nickname already exists" })),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct WsQuery {
    nick: Option<String>,
}

async fn ws_upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(nickname) = query.nick.filter(|n| !n.trim().is_empty()) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let Some(record) = state.directory.get(&nickname) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    ws.on_upgrade(move |socket| async move {
        let spawn = resolve_spawn(&state, &record.nickname).await;
        session::run_session(
            state.host.clone(),
            state.directory.clone(),
            state.state_client.clone(),
            socket,
            record.nickname,
            spawn,
        )
        .await;
    })
}

/// Prefer the persisted pose when it is still walkable, else a random spawn
/// cell; a full map falls back to the default corner.
async fn resolve_spawn(state: &AppState, nickname: &str) -> Pose {
    if let Some(saved) = state.state_client.load(nickname).await {
        if state.host.is_walkable(saved.x, saved.y) {
            return Pose::new(saved.x, saved.y, saved.a);
        }
        debug!("Persisted pose for '{}' is not walkable, respawning", nickname);
    }
    if let Some((x, y)) = state.host.try_spawn() {
        return Pose::new(x, y, DEFAULT_HEADING);
    }
    let (x, y) = FALLBACK_SPAWN;
    Pose::new(x, y, DEFAULT_HEADING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyticsConfig;
    use crate::game::map::TileGrid;
    use crate::services::analytics::AnalyticsService;

    fn test_state() -> AppState {
        AppState {
            host: Arc::new(WorldHost::new(
                Arc::new(TileGrid::open(20, 10)),
                AnalyticsService::start(AnalyticsConfig::default()),
            )),
            directory: Arc::new(PlayerDirectory::new()),
            state_client: Arc::new(PlayerStateClient::new(None)),
        }
    }

    #[tokio::test]
    async fn test_spawn_resolution_without_persistence() {
        let state = test_state();
        let pose = resolve_spawn(&state, "alice").await;
        assert!(state.host.is_walkable(pose.x, pose.y));
        assert!((pose.a - DEFAULT_HEADING).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_router_builds() {
        let _router = router(test_state());
    }
}
