//! WebSocket transport in front of the real-time engine.
//!
//! One socket carries at most one subscription: the user's own channel.
//! Publications on it are forwarded verbatim; control frames follow
//! [`InboundMessage`] and [`OutboundMessage`].

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use murmur_core::error::AppError;
use murmur_realtime::RealtimeEngine;
use murmur_realtime::message::{InboundMessage, OutboundMessage};
use murmur_realtime::pubsub::Publication;

use crate::error::{ApiError, status_for};
use crate::state::AppState;

/// Query parameter for WebSocket authentication.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// JWT access token.
    pub token: Option<String>,
}

/// A live listener on a substrate channel.
struct Subscription {
    channel: String,
    receiver: broadcast::Receiver<Publication>,
}

type WsSink = SplitSink<WebSocket, Message>;

/// GET /ws?token={jwt}
///
/// The token is checked before the upgrade; a bad token never gets a socket.
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    let token = query
        .token
        .ok_or_else(|| AppError::authentication("Missing token"))?;
    let user_id = state.realtime.authenticate(&token)?;

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };
    let engine = state.realtime.clone();
    Ok(ws.on_upgrade(move |socket| handle_ws_connection(engine, user_id, socket)))
}

/// Drives one established connection until either side closes it.
async fn handle_ws_connection(engine: RealtimeEngine, user_id: Uuid, socket: WebSocket) {
    let (mut sink, mut stream) = socket.split();
    engine.on_connect(user_id);

    let mut subscription: Option<Subscription> = None;

    loop {
        tokio::select! {
            frame = stream.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        debug!(user_id = %user_id, error = %e, "WebSocket read failed");
                        break;
                    }
                };
                if !handle_frame(&engine, user_id, text.as_str(), &mut sink, &mut subscription).await {
                    break;
                }
            }
            publication = next_publication(&mut subscription) => {
                match publication {
                    Ok(payload) => {
                        if sink.send(Message::Text(payload.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(user_id = %user_id, skipped, "Subscriber lagged, events dropped");
                    }
                    Err(RecvError::Closed) => {
                        subscription = None;
                    }
                }
            }
        }
    }

    if let Some(sub) = subscription.take() {
        drop(sub.receiver);
        engine.release(&sub.channel).await;
    }
    engine.on_disconnect(user_id);
    info!(user_id = %user_id, "WebSocket connection closed");
}

/// Waits for the next publication, or forever when not subscribed.
async fn next_publication(subscription: &mut Option<Subscription>) -> Result<Publication, RecvError> {
    match subscription {
        Some(sub) => sub.receiver.recv().await,
        None => std::future::pending().await,
    }
}

/// Handles one client frame. Returns `false` once the socket is unusable.
async fn handle_frame(
    engine: &RealtimeEngine,
    user_id: Uuid,
    text: &str,
    sink: &mut WsSink,
    subscription: &mut Option<Subscription>,
) -> bool {
    let inbound: InboundMessage = match serde_json::from_str(text) {
        Ok(inbound) => inbound,
        Err(e) => {
            return send_control(sink, &error_frame(&AppError::validation(format!("Invalid frame: {e}"))))
                .await;
        }
    };

    match inbound {
        InboundMessage::Ping => send_control(sink, &OutboundMessage::Pong).await,
        InboundMessage::Subscribe { channel } => {
            subscribe(engine, user_id, channel, sink, subscription).await
        }
        InboundMessage::Unsubscribe { channel } => {
            if let Some(sub) = subscription.take_if(|sub| sub.channel == channel) {
                drop(sub.receiver);
                engine.release(&sub.channel).await;
            }
            send_control(sink, &OutboundMessage::Unsubscribed { channel }).await
        }
    }
}

/// Subscribe, acknowledge, then release READY.
///
/// The substrate listener is registered and the ack written before the
/// ticket is confirmed, so READY is the first publication the client sees.
async fn subscribe(
    engine: &RealtimeEngine,
    user_id: Uuid,
    channel: String,
    sink: &mut WsSink,
    subscription: &mut Option<Subscription>,
) -> bool {
    if subscription.as_ref().is_some_and(|sub| sub.channel == channel) {
        return send_control(sink, &OutboundMessage::Subscribed { channel }).await;
    }

    let ticket = match engine.on_subscribe(user_id, &channel).await {
        Ok(ticket) => ticket,
        Err(e) => return send_control(sink, &error_frame(&e)).await,
    };
    let receiver = match engine.listen(&channel).await {
        Ok(receiver) => receiver,
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "Failed to listen on channel");
            return send_control(sink, &error_frame(&e)).await;
        }
    };

    if let Some(previous) = subscription.replace(Subscription {
        channel: channel.clone(),
        receiver,
    }) {
        drop(previous.receiver);
        engine.release(&previous.channel).await;
    }

    if !send_control(sink, &OutboundMessage::Subscribed { channel }).await {
        return false;
    }
    ticket.confirm();
    true
}

fn error_frame(err: &AppError) -> OutboundMessage {
    OutboundMessage::Error {
        code: status_for(err.kind).1.to_string(),
        message: err.message.clone(),
    }
}

async fn send_control(sink: &mut WsSink, frame: &OutboundMessage) -> bool {
    let text = match serde_json::to_string(frame) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Failed to encode control frame");
            return true;
        }
    };
    sink.send(Message::Text(text.into())).await.is_ok()
}
