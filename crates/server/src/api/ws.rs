//! Observer WebSocket: job notifications pushed to connected clients.

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use mediashrink_core::ObserverConnection;

use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_MESSAGES_RELAYED};
use crate::state::AppState;

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle a single observer connection.
///
/// The socket is closed as soon as the registry drops the observer, so a
/// client never stays connected without receiving notifications.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let notify = &state.config().notify;
    let relay = notify.relay_client_messages;
    let (connection, mut outbound, mut relayed) = if relay {
        let (connection, outbound, relayed) = ObserverConnection::with_relay(notify.observer_buffer);
        (connection, outbound, Some(relayed))
    } else {
        let (connection, outbound) = ObserverConnection::channel(notify.observer_buffer);
        (connection, outbound, None)
    };
    let registry = Arc::clone(state.registry());
    let id = registry.register(connection).await;

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();
    info!(observer = %id, "WebSocket client connected");

    // Job notifications go first; relayed client messages fill the gaps.
    let mut send_task = tokio::spawn(async move {
        loop {
            let payload = tokio::select! {
                biased;
                next = outbound.recv() => match next {
                    Some(payload) => payload,
                    None => {
                        let frame = CloseFrame {
                            code: close_code::AGAIN,
                            reason: "observer dropped, reconnect".into(),
                        };
                        let _ = sender.send(Message::Close(Some(frame))).await;
                        return;
                    }
                },
                Some(payload) = next_relayed(&mut relayed) => payload,
            };
            if sender
                .send(Message::Text(payload.as_ref().into()))
                .await
                .is_err()
            {
                debug!("WebSocket send failed, client disconnected");
                return;
            }
        }
    });

    loop {
        tokio::select! {
            _ = &mut send_task => {
                debug!(observer = %id, "Observer queue closed, ending connection");
                break;
            }
            next = receiver.next() => match next {
                Some(Ok(Message::Close(_))) | None => {
                    debug!("WebSocket client requested close");
                    break;
                }
                Some(Ok(Message::Text(text))) => {
                    if relay {
                        WS_MESSAGES_RELAYED.inc();
                        registry.relay(text.as_str()).await;
                    } else {
                        debug!("Ignoring client text message: {}", text.as_str());
                    }
                }
                Some(Ok(_)) => {
                    // Pings are answered by axum; binary frames are ignored.
                }
                Some(Err(e)) => {
                    warn!("WebSocket receive error: {}", e);
                    break;
                }
            }
        }
    }

    registry.unregister(id).await;
    send_task.abort();
    WS_CONNECTIONS_ACTIVE.dec();
    info!(observer = %id, "WebSocket client disconnected");
}

async fn next_relayed(relayed: &mut Option<mpsc::Receiver<Arc<str>>>) -> Option<Arc<str>> {
    match relayed {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
