//! Axum WebSocket handler
//!
//! This module contains the WebSocket upgrade handler for Axum and the
//! per-connection loop driving a [`SessionBridge`].

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::select;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::core::stt::event_channel;
use crate::state::AppState;

use super::bridge::SessionBridge;
use super::error::WebSocketError;
use super::messages::{MessageRoute, OutgoingMessage};

/// Buffer size of the outgoing client channel
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Speech recognition bridge handler
/// Upgrades the HTTP connection to WebSocket and bridges it to the default provider
pub async fn ws_asr_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!("WebSocket ASR connection upgrade requested");
    ws.on_upgrade(move |socket| handle_asr_socket(socket, state))
}

/// Handle one client connection for its whole lifetime
async fn handle_asr_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("WebSocket ASR connection established");

    let (mut sender, mut receiver) = socket.split();

    let (message_tx, mut message_rx) = mpsc::channel::<MessageRoute>(CHANNEL_BUFFER_SIZE);

    // Outgoing messages are serialized and written in order by a single task
    let sender_task = tokio::spawn(async move {
        while let Some(route) = message_rx.recv().await {
            let result = match route {
                MessageRoute::Outgoing(message) => match serde_json::to_string(&message) {
                    Ok(json_str) => sender.send(Message::Text(json_str.into())).await,
                    Err(e) => {
                        error!("Failed to serialize outgoing message: {}", e);
                        continue;
                    }
                },
                MessageRoute::Close => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            };

            if let Err(e) = result {
                error!("Failed to send WebSocket message: {}", e);
                break;
            }
        }
    });

    let (event_tx, mut event_rx) = event_channel();

    let stt = match app_state.core_state.stt_factory.create(None, event_tx) {
        Ok(stt) => stt,
        Err(e) => {
            let err = WebSocketError::ProviderCreation(e);
            error!("{}", err);
            let _ = message_tx
                .send(MessageRoute::Outgoing(OutgoingMessage::Error {
                    error: err.to_message(),
                }))
                .await;
            let _ = message_tx.send(MessageRoute::Close).await;
            drop(message_tx);
            let _ = sender_task.await;
            return;
        }
    };

    let mut bridge = SessionBridge::new(stt, message_tx.clone());

    if bridge.start().await.is_err() {
        // The bridge already queued the error and the close request
        drop(bridge);
        drop(message_tx);
        let _ = sender_task.await;
        info!("WebSocket ASR connection terminated");
        return;
    }

    loop {
        select! {
            msg_result = receiver.next() => {
                match msg_result {
                    Some(Ok(msg)) => {
                        if !bridge.handle_client_message(msg).await {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        info!("WebSocket connection closed by client");
                        break;
                    }
                }
            }
            Some(event) = event_rx.recv() => {
                bridge.handle_provider_event(event).await;
            }
        }
    }

    bridge.shutdown();
    sender_task.abort();

    info!(
        provider = bridge.provider_name(),
        "WebSocket ASR connection terminated"
    );
}
