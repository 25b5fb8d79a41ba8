//! HTTP surface: room listing, room occupancy and the websocket upgrade.
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /` | JSON list of [`RoomRef`] |
//! | `GET /{building}/{room}` | JSON [`RoomInfo`] |
//! | `GET /ws/{building}/{room}?user=<name>` | websocket session |

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use cell_framework::{Environment, MeshError};
use futures::StreamExt;
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::clients::{BuildingClient, RoomClient};
use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::gateway::run_session;
use crate::model::{room_id, user_id, RoomInfo, RoomRef, PUBLIC_ADDRESS_USER};

#[derive(Clone)]
pub struct AppState {
    pub env: Environment,
    pub config: Arc<ChatConfig>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_rooms))
        .route("/ws/{building}/{room}", get(ws_room))
        .route("/{building}/{room}", get(room_info))
        .with_state(state)
}

/// Serves the chat API on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, "Chat server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Maps chat failures onto status codes.
struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        let status = match &err {
            ChatError::RoomNotFound(_) | ChatError::BuildingNotFound(_) => StatusCode::NOT_FOUND,
            ChatError::Mesh(MeshError::NotFound(_)) => StatusCode::NOT_FOUND,
            ChatError::ReservedName(_) | ChatError::Mesh(MeshError::AlreadyExists(_)) => {
                StatusCode::CONFLICT
            }
            ChatError::Mesh(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError(status, err.to_string())
    }
}

async fn list_rooms(State(state): State<AppState>) -> Result<Json<Vec<RoomRef>>, ApiError> {
    let client = BuildingClient::new(
        state.env.clone(),
        &state.config.building,
        state.config.query_timeout,
    );
    let rooms = client.list_rooms().await?;
    Ok(Json(
        rooms.iter().filter_map(|id| RoomRef::from_id(id)).collect(),
    ))
}

async fn room_info(
    Path((building, room)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<RoomInfo>, ApiError> {
    let id = room_id(&building, &room);
    if !state.env.has_cell(id.as_str()) {
        return Err(ChatError::RoomNotFound(id).into());
    }
    let client = RoomClient::new(state.env.clone(), &building, &room, state.config.query_timeout);
    let users = client.user_count().await?;
    Ok(Json(RoomInfo {
        room: id.to_string(),
        users,
    }))
}

#[derive(Debug, Deserialize)]
struct JoinParams {
    user: Option<String>,
}

async fn ws_room(
    Path((building, room)): Path<(String, String)>,
    Query(params): Query<JoinParams>,
    State(state): State<AppState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let user = match params.user.as_deref().map(str::trim) {
        Some(user) if !user.is_empty() && user != "undefined" => user.to_string(),
        _ => return (StatusCode::BAD_REQUEST, "user name not specified").into_response(),
    };

    let room_cell = room_id(&building, &room);
    if !state.env.has_cell(room_cell.as_str()) {
        return (StatusCode::NOT_FOUND, format!("room not found: {room_cell}")).into_response();
    }
    let user_cell = user_id(&user);
    if user_cell == PUBLIC_ADDRESS_USER || state.env.has_cell(user_cell.as_str()) {
        return (StatusCode::CONFLICT, format!("{user} is already connected")).into_response();
    }

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    let settings = state.config.gateway.clone();
    ws.max_message_size(settings.max_message_size)
        .on_upgrade(move |socket| async move {
            info!(%user, %building, %room, "Websocket connected");
            let (writer, reader) = socket.split();
            if let Err(err) =
                run_session(&state.env, &building, &room, &user, settings, reader, writer).await
            {
                warn!(%user, error = %err, "Websocket session ended with error");
            }
        })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::util::ServiceExt;

    use super::*;
    use crate::building::{add_building, add_room};
    use crate::user::add_user;

    async fn test_state() -> AppState {
        let env = Environment::new();
        let config = ChatConfig {
            announce_interval: None,
            ..ChatConfig::default()
        };
        add_building(&env, &config.building, None).await.unwrap();
        add_room(
            &env,
            &config.building,
            "cafeteria",
            &config.censored_words,
            Duration::from_millis(200),
        )
        .await
        .unwrap();
        AppState {
            env,
            config: Arc::new(config),
        }
    }

    async fn get(state: &AppState, uri: &str) -> Response {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("Failed to build request");
        router(state.clone())
            .oneshot(request)
            .await
            .expect("Failed to execute request")
    }

    async fn json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_list_rooms() {
        let state = test_state().await;

        let response = get(&state, "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(
            body,
            serde_json::json!([{
                "id": "room:school:cafeteria",
                "building": "school",
                "room": "cafeteria"
            }])
        );
    }

    #[tokio::test]
    async fn test_room_info_counts_users() {
        let state = test_state().await;
        add_user(&state.env, "school", "cafeteria", "bart").await.unwrap();

        let response = get(&state, "/school/cafeteria").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["room"], "room:school:cafeteria");
        assert_eq!(body["users"], 1);
    }

    #[tokio::test]
    async fn test_unknown_room_is_not_found() {
        let state = test_state().await;

        let response = get(&state, "/school/gym").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = get(&state, "/ws/school/gym?user=bart").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ws_requires_user_name() {
        let state = test_state().await;

        let response = get(&state, "/ws/school/cafeteria").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = get(&state, "/ws/school/cafeteria?user=undefined").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ws_rejects_taken_name() {
        let state = test_state().await;
        add_user(&state.env, "school", "cafeteria", "bart").await.unwrap();

        let response = get(&state, "/ws/school/cafeteria?user=bart").await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let response = get(&state, "/ws/school/cafeteria?user=public%20address").await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_ws_without_upgrade_is_rejected() {
        let state = test_state().await;

        let response = get(&state, "/ws/school/cafeteria?user=lisa").await;
        assert!(response.status().is_client_error());
        assert!(!state.env.has_cell("user:lisa"));
    }
}
