use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{
        Query, State, WebSocketUpgrade,
        ws::{CloseFrame, Message, WebSocket, close_code},
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::AppState;
use crate::delivery::http::v1::middleware::bearer_token;
use crate::domain::notification::Notification;
use crate::usecase::error::UsecaseError;
use crate::usecase::jwt::{Identity, JwtService};

#[derive(Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Authenticated,
    Streaming,
    Closed,
}

/// Why a streaming session stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The registry dropped this session's queue, e.g. a newer session of the
    /// same user evicted it.
    Displaced,
    ClientClosed,
    /// The client stream ended without a Close frame.
    ClientGone,
    ReceiveFailed(String),
    SendFailed(String),
}

#[derive(Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
enum ServerEvent<'a> {
    Notification(&'a Notification),
}

/// Resolves the user behind an upgrade request. The Authorization header wins
/// over the `?token=` query parameter, which exists because browsers cannot set
/// headers on an upgrade request.
pub fn session_identity(headers: &HeaderMap, query: &WsQuery, jwt: &JwtService) -> Result<Identity, UsecaseError> {
    let token = bearer_token(headers)
        .or(query.token.as_deref())
        .ok_or_else(|| UsecaseError::Unauthorized("Missing token".to_string()))?;

    Ok(jwt.authenticate(token)?)
}

/// Authenticates before the upgrade, then forwards every notification queued
/// for the session as a JSON text frame until either side goes away.
pub async fn notifications_ws(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    Query(query): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    tracing::debug!(state = ?SessionState::Connecting, "websocket session requested");

    let identity = match session_identity(&headers, &query, &state.jwt_service) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(state = ?SessionState::Closed, error = %e, "websocket rejected");
            return e.into_response();
        }
    };

    let user_id = identity.user_id;
    tracing::info!(user_id, "websocket authenticated, upgrading");
    ws.on_upgrade(move |socket| run_session(socket, user_id, state))
}

async fn run_session(socket: WebSocket, user_id: i64, state: Arc<AppState>) {
    let (guard, receiver) = state.registry.register(user_id);
    let session_id = guard.session_id();
    tracing::info!(
        user_id = guard.user_id(),
        %session_id,
        sessions = state.registry.session_count(user_id),
        state = ?SessionState::Authenticated,
        "session registered"
    );

    let (sink, stream) = socket.split();
    tracing::debug!(user_id, %session_id, state = ?SessionState::Streaming, "streaming notifications");

    let end = stream_notifications(sink, stream, receiver, state.realtime_ping_interval).await;

    tracing::info!(user_id, %session_id, state = ?SessionState::Closed, reason = ?end, "session ended");
    drop(guard);
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Forwards queued notifications to `sink` until the queue closes, the client
/// leaves, or a write fails. Frames go out in queue order.
pub async fn stream_notifications<S, R, E>(
    mut sink: S,
    mut stream: R,
    mut notifications: mpsc::Receiver<Notification>,
    ping_interval: Option<Duration>,
) -> SessionEnd
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let mut ticker = ping_interval.map(|period| {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });

    let end = loop {
        tokio::select! {
            queued = notifications.recv() => {
                let Some(notification) = queued else {
                    break SessionEnd::Displaced;
                };
                let payload = match serde_json::to_string(&ServerEvent::Notification(&notification)) {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::error!(notification_id = notification.id, error = %e, "failed to encode notification");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(payload.into())).await {
                    break SessionEnd::SendFailed(e.to_string());
                }
                tracing::debug!(notification_id = notification.id, "notification pushed");
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) => break SessionEnd::ClientClosed,
                    None => break SessionEnd::ClientGone,
                    Some(Err(e)) => break SessionEnd::ReceiveFailed(e.to_string()),
                    // Pongs and client chatter are ignored.
                    Some(Ok(_)) => {}
                }
            }
            _ = next_tick(&mut ticker) => {
                if let Err(e) = sink.send(Message::Ping(Bytes::new())).await {
                    break SessionEnd::SendFailed(e.to_string());
                }
            }
        }
    };

    if end == SessionEnd::Displaced {
        let frame = CloseFrame {
            code: close_code::NORMAL,
            reason: "session replaced".into(),
        };
        if let Err(e) = sink.send(Message::Close(Some(frame))).await {
            tracing::debug!(error = %e, "failed to send close frame");
        }
    }
    if let Err(e) = sink.close().await {
        tracing::debug!(error = %e, "failed to close socket");
    }

    end
}
