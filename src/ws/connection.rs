//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::filter::PoolFilter;
use crate::domain::{PoolEvent, PoolId};
use crate::service::MembershipService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<PoolEvent>,
    membership_service: Arc<MembershipService>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut filter = PoolFilter::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, &mut filter, &membership_service).await;
                        if let Ok(json) = serde_json::to_string(&reply)
                            && ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(pool_event) => {
                        if filter.admits(pool_event.pool_id()) {
                            let msg = WsMessage::new(
                                uuid::Uuid::new_v4().to_string(),
                                WsMessageType::Event,
                                serde_json::to_value(&pool_event).unwrap_or_default(),
                            );
                            let json = serde_json::to_string(&msg).unwrap_or_default();
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Splits raw pool ID strings into parsed IDs and a wildcard flag. Entries
/// that are neither `"*"` nor a UUID are ignored.
fn parse_pool_ids(raw: &[String]) -> (Vec<PoolId>, bool) {
    let wildcard = raw.iter().any(|s| s == "*");
    let ids = raw.iter().filter_map(|s| s.parse::<PoolId>().ok()).collect();
    (ids, wildcard)
}

/// Handles a text message from the client and returns the reply.
async fn handle_text_message(
    text: &str,
    filter: &mut PoolFilter,
    membership_service: &MembershipService,
) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error("", 400, "malformed JSON");
    };
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return WsMessage::error(msg.id, 404, "unknown command");
    };

    match command {
        WsCommand::Subscribe { pool_ids } => {
            let (ids, wildcard) = parse_pool_ids(&pool_ids);
            filter.follow(&ids, wildcard);
            WsMessage::new(msg.id, WsMessageType::Response, filter.state())
        }
        WsCommand::Unsubscribe { pool_ids } => {
            let (ids, wildcard) = parse_pool_ids(&pool_ids);
            filter.unfollow(&ids, wildcard);
            WsMessage::new(msg.id, WsMessageType::Response, filter.state())
        }
        WsCommand::GetMembership { pool_id } => {
            let Ok(pool_id) = pool_id.parse::<PoolId>() else {
                return WsMessage::error(msg.id, 400, "invalid pool_id");
            };
            match membership_service.get_membership(pool_id).await {
                Ok(membership) => WsMessage::new(
                    msg.id,
                    WsMessageType::Response,
                    serde_json::json!({
                        "pool_id": pool_id,
                        "summary": membership.summary(),
                        "devices": membership.devices,
                        "links": membership.links,
                    }),
                ),
                Err(e) => WsMessage::error(msg.id, e.error_code(), e.to_string()),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{EventBus, InMemoryObjectRegistry, ObjectRegistry, PoolDefinition, PoolRegistry, PropertyCatalog};
    use crate::persistence::{InMemoryMembershipStore, MembershipStore};
    use crate::service::RecomputeSettings;

    fn service() -> MembershipService {
        MembershipService::new(
            Arc::new(PoolRegistry::new()),
            Arc::new(InMemoryObjectRegistry::new()) as Arc<dyn ObjectRegistry>,
            Arc::new(InMemoryMembershipStore::new()) as Arc<dyn MembershipStore>,
            Arc::new(PropertyCatalog::default()),
            EventBus::new(16),
            RecomputeSettings::default(),
        )
    }

    fn command(payload: serde_json::Value) -> String {
        serde_json::json!({"id": "req-1", "type": "command", "payload": payload}).to_string()
    }

    #[tokio::test]
    async fn subscribe_and_unsubscribe() {
        let svc = service();
        let mut filter = PoolFilter::new();
        let id = PoolId::new();

        let text = command(serde_json::json!({"command": "subscribe", "pool_ids": [id.to_string(), "junk"]}));
        let reply = handle_text_message(&text, &mut filter, &svc).await;
        assert_eq!(reply.msg_type, WsMessageType::Response);
        assert_eq!(reply.id, "req-1");
        assert!(filter.admits(id));
        assert_eq!(reply.payload["followed"], serde_json::json!([id.to_string()]));

        let text = command(serde_json::json!({"command": "unsubscribe", "pool_ids": [id.to_string()]}));
        let _ = handle_text_message(&text, &mut filter, &svc).await;
        assert!(!filter.admits(id));
    }

    #[tokio::test]
    async fn get_membership_reports_summary() {
        let svc = service();
        let Ok(pool_id) = svc
            .create_pool(PoolDefinition {
                name: "all".to_string(),
                ..PoolDefinition::default()
            })
            .await
        else {
            panic!("pool creation failed");
        };
        let mut filter = PoolFilter::new();
        let text = command(serde_json::json!({"command": "get_membership", "pool_id": pool_id.to_string()}));
        let reply = handle_text_message(&text, &mut filter, &svc).await;
        assert_eq!(reply.msg_type, WsMessageType::Response);
        assert_eq!(reply.payload["summary"], "0 devices - 0 links");

        let text = command(serde_json::json!({"command": "get_membership", "pool_id": PoolId::new().to_string()}));
        let reply = handle_text_message(&text, &mut filter, &svc).await;
        assert_eq!(reply.msg_type, WsMessageType::Error);
        assert_eq!(reply.payload["code"], 2001);
    }

    #[tokio::test]
    async fn malformed_and_unknown_messages_are_errors() {
        let svc = service();
        let mut filter = PoolFilter::new();
        let reply = handle_text_message("{not json", &mut filter, &svc).await;
        assert_eq!(reply.msg_type, WsMessageType::Error);

        let text = command(serde_json::json!({"command": "reboot"}));
        let reply = handle_text_message(&text, &mut filter, &svc).await;
        assert_eq!(reply.payload["code"], 404);
    }
}
