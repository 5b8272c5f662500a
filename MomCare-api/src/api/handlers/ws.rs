//! Realtime WebSocket endpoint
//!
//! Sockets authenticate with `?token=` and are joined to their own user room.
//! Provider sockets also receive clinic-wide events.

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use mom_care_domain::auth::logging::log_token_validation;
use mom_care_domain::entities::User;
use mom_care_domain::notify::{RealtimeHub, RoomSet};
use mom_care_domain::services::AccountService;

use crate::api::state::AppState;
use crate::entities::ErrorResponse;

const JOIN_ROOM: &str = "join-room";

#[derive(Debug, Deserialize)]
pub struct SocketQuery {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClientFrame {
    event: String,
    #[serde(default)]
    data: Value,
}

pub async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<SocketQuery>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let user = match authenticate_socket(&state.services.accounts, query.token).await {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };

    match upgrade {
        Ok(upgrade) => {
            let hub = state.hub.clone();
            upgrade.on_upgrade(move |socket| run_socket(socket, user, hub))
        }
        Err(rejection) => rejection.into_response(),
    }
}

/// Resolve the `?token=` parameter to an account, logging the decision
async fn authenticate_socket(accounts: &AccountService, token: Option<String>) -> Result<User, ErrorResponse> {
    let token = match token.filter(|t| !t.is_empty()) {
        Some(token) => token,
        None => {
            log_token_validation(None, false, "socket: no auth token provided");
            return Err(ErrorResponse::unauthorized("No auth token provided"));
        }
    };

    match accounts.authenticate(&token).await {
        Ok(user) => {
            log_token_validation(Some(&user.id), true, "socket");
            Ok(user)
        }
        Err(err) => {
            log_token_validation(None, false, &format!("socket: {}", err));
            Err(ErrorResponse::from(err))
        }
    }
}

fn initial_rooms(user: &User) -> RoomSet {
    let mut rooms = RoomSet::default();
    rooms.join_user(&user.id);
    if user.is_provider() {
        rooms.join_clinic();
    }
    rooms
}

fn error_frame(message: &str) -> String {
    json!({ "event": "error", "data": message }).to_string()
}

/// Apply one client frame; returns a frame to send back, if any
fn handle_client_frame(user_id: &str, text: &str, rooms: &mut RoomSet) -> Option<String> {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(_) => return Some(error_frame("Invalid frame")),
    };

    match frame.event.as_str() {
        JOIN_ROOM => match frame.data.as_str() {
            Some(id) if id == user_id => {
                rooms.join_user(id);
                None
            }
            _ => Some(error_frame("Cannot join another user's room")),
        },
        other => Some(error_frame(&format!("Unknown event: {}", other))),
    }
}

async fn run_socket(mut socket: WebSocket, user: User, hub: RealtimeHub) {
    let mut rooms = initial_rooms(&user);
    let mut events = hub.subscribe();
    info!("Realtime socket opened for user {}", user.id);

    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Some(reply) = handle_client_frame(&user.id, &text, &mut rooms) {
                        if socket.send(Message::Text(reply)).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Ping(payload))) => {
                    if socket.send(Message::Pong(payload)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("Socket error for user {}: {}", user.id, e);
                    break;
                }
            },
            event = events.recv() => match event {
                Ok(event) if rooms.accepts(&event.audience) => {
                    let text = match serde_json::to_string(&event.frame()) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("Failed to encode realtime event {}: {}", event.event, e);
                            continue;
                        }
                    };
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Realtime socket for user {} skipped {} events", user.id, skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    info!("Realtime socket closed for user {}", user.id);
}
