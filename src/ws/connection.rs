//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands on behalf of the connected user and
//! forwarding the notices addressed to them.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use crate::api::dto::{ClassDto, SubscriptionResponse};
use crate::domain::{ClassNotice, ClassUri, UserId};
use crate::error::SubscriptionError;
use crate::service::SubscriptionService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and runs them as `user_id`.
/// - Forwards notices for `user_id` from the [`broadcast::Receiver`].
pub async fn run_connection(
    socket: WebSocket,
    user_id: UserId,
    mut event_rx: broadcast::Receiver<ClassNotice>,
    subscriptions: Arc<SubscriptionService>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, &user_id, &subscriptions).await;
                        if ws_tx.send(Message::text(reply.to_text())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            notice = event_rx.recv() => {
                match notice {
                    Ok(notice) => {
                        if notice.user_id() != &user_id {
                            continue;
                        }
                        let payload = serde_json::to_value(&notice).unwrap_or_default();
                        let text = WsMessage::event(payload).to_text();
                        if ws_tx.send(Message::text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(%user_id, lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!(%user_id, "ws connection closed");
}

/// Parses a client frame and runs the command it carries.
async fn handle_text_message(
    text: &str,
    user_id: &UserId,
    subscriptions: &SubscriptionService,
) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error(String::new(), 400, "malformed JSON");
    };
    if msg.msg_type != WsMessageType::Command {
        return WsMessage::error(msg.id, 400, "expected a command");
    }
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return WsMessage::error(msg.id, 404, "unknown command");
    };

    match run_command(command, user_id, subscriptions).await {
        Ok(payload) => WsMessage::response(msg.id, payload),
        Err(reply) => reply.into_message(msg.id),
    }
}

/// Failure of a WebSocket command, rendered as an error envelope.
#[derive(Debug)]
enum CommandError {
    /// The command's arguments were rejected before reaching the service.
    Invalid(String),
    /// The service failed; the user sees only the generic message.
    Subscription(SubscriptionError),
}

impl CommandError {
    fn into_message(self, id: String) -> WsMessage {
        match self {
            Self::Invalid(message) => WsMessage::error(id, 400, &message),
            Self::Subscription(err) => {
                tracing::warn!(error = %err, operation = %err.operation(), "ws command failed");
                WsMessage::error(id, err.error_code(), err.user_message())
            }
        }
    }
}

async fn run_command(
    command: WsCommand,
    user_id: &UserId,
    subscriptions: &SubscriptionService,
) -> Result<serde_json::Value, CommandError> {
    match command {
        WsCommand::Subscribe { uri } => {
            let uri = parse_uri(&uri)?;
            let event = subscriptions
                .subscribe(&uri, user_id)
                .await
                .map_err(CommandError::Subscription)?;
            Ok(to_payload(&SubscriptionResponse {
                user_id: user_id.clone(),
                subscribed: true,
                class: ClassDto::from(event),
            }))
        }
        WsCommand::Unsubscribe { uri } => {
            let uri = parse_uri(&uri)?;
            let event = subscriptions
                .unsubscribe(&uri, user_id)
                .await
                .map_err(CommandError::Subscription)?;
            Ok(to_payload(&SubscriptionResponse {
                user_id: user_id.clone(),
                subscribed: false,
                class: ClassDto::from(event),
            }))
        }
        WsCommand::Classes => {
            let events = subscriptions
                .list_subscriptions(user_id)
                .await
                .map_err(CommandError::Subscription)?;
            let classes: Vec<ClassDto> = events.iter().map(ClassDto::from).collect();
            Ok(serde_json::json!({
                "user_id": user_id,
                "classes": classes,
            }))
        }
    }
}

fn parse_uri(raw: &str) -> Result<ClassUri, CommandError> {
    ClassUri::parse(raw).map_err(|e| CommandError::Invalid(e.to_string()))
}

fn to_payload<T: serde::Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_default()
}
