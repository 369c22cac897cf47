//! Session bridge between one client connection and one provider session
//!
//! The bridge owns the provider session. The connection handler feeds it
//! client frames and provider events one at a time, so no locking is needed.

use axum::extract::ws::Message;
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::core::stt::{BaseSTT, STTEvent};

use super::error::{WebSocketError, WebSocketResult};
use super::messages::{ClientInput, MessageRoute, OutgoingMessage};
use super::state::BridgeState;

/// Text of the `connected` message sent once the provider is ready
pub const CONNECTED_MESSAGE: &str = "Connected to speech recognition service";

pub struct SessionBridge {
    state: BridgeState,
    stt: Box<dyn BaseSTT>,
    outgoing: mpsc::Sender<MessageRoute>,
}

impl SessionBridge {
    pub fn new(stt: Box<dyn BaseSTT>, outgoing: mpsc::Sender<MessageRoute>) -> Self {
        Self {
            state: BridgeState::Init,
            stt,
            outgoing,
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn provider_name(&self) -> &'static str {
        self.stt.provider_name()
    }

    /// Connect the provider session and announce the result to the client
    ///
    /// On failure the client receives an error followed by a close request,
    /// and the bridge ends in `Closed` without ever becoming active.
    pub async fn start(&mut self) -> WebSocketResult<()> {
        if self.state != BridgeState::Init {
            warn!(state = %self.state, "Session bridge already started");
            return Ok(());
        }

        self.state = BridgeState::Connecting;
        info!(
            provider = self.stt.provider_name(),
            "Connecting to {}",
            self.stt.get_provider_info()
        );

        match self.stt.connect().await {
            Ok(()) => {
                self.state = BridgeState::Active;
                info!(
                    provider = self.stt.provider_name(),
                    task_id = self.stt.task_id().unwrap_or_default(),
                    "Session bridge active"
                );
                self.send(OutgoingMessage::Connected {
                    message: CONNECTED_MESSAGE.to_string(),
                })
                .await;
                Ok(())
            }
            Err(e) => {
                let err = WebSocketError::ProviderConnection(e);
                error!(provider = self.stt.provider_name(), "{}", err);
                self.send(OutgoingMessage::Error {
                    error: err.to_message(),
                })
                .await;
                self.route(MessageRoute::Close).await;
                self.state = BridgeState::Closed;
                Err(err)
            }
        }
    }

    /// Handle one frame from the client
    ///
    /// Returns `false` when the client asked to close the connection.
    pub async fn handle_client_message(&mut self, msg: Message) -> bool {
        let data = match msg {
            Message::Binary(data) => {
                debug!("Received binary message: {} bytes", data.len());
                data
            }
            Message::Text(text) => {
                debug!("Received text message: {} bytes", text.len());
                Bytes::copy_from_slice(text.as_str().as_bytes())
            }
            Message::Ping(_) | Message::Pong(_) => return true,
            Message::Close(_) => {
                info!("WebSocket connection closed by client");
                return false;
            }
        };

        match self.state {
            BridgeState::Active => {}
            BridgeState::Closed => return false,
            state => {
                warn!(%state, "Dropping client message received before bridge is active");
                return true;
            }
        }

        let result = match ClientInput::classify(data) {
            ClientInput::Audio(audio) => self.stt.send_audio(audio, false),
            ClientInput::EndOfStream => {
                info!("Client marked end of recording");
                self.stt.send_audio(Bytes::new(), true)
            }
        };

        if let Err(e) = result {
            let err = WebSocketError::AudioProcessing(e);
            error!("{}", err);
            self.send(OutgoingMessage::Error {
                error: err.to_message(),
            })
            .await;
        }

        true
    }

    /// Relay one provider event to the client
    pub async fn handle_provider_event(&mut self, event: STTEvent) {
        if !self.state.is_active() {
            debug!(state = %self.state, "Dropping provider event on inactive bridge");
            return;
        }

        match event {
            STTEvent::Result(result) => {
                debug!(
                    is_final = result.is_final,
                    "Relaying recognition result: {}", result.text
                );
                self.send(OutgoingMessage::Result { data: result }).await;
            }
            STTEvent::Error(e) => {
                let code = e.code();
                let err = WebSocketError::Provider(e);
                warn!(provider = self.stt.provider_name(), ?code, "{}", err);
                self.send(OutgoingMessage::Error {
                    error: err.to_message(),
                })
                .await;
            }
            STTEvent::Close(info) => {
                info!(
                    provider = self.stt.provider_name(),
                    code = ?info.code,
                    reason = %info.reason,
                    "Provider connection closed"
                );
            }
        }
    }

    /// Stop relaying and close the provider session
    ///
    /// Only the first call has any effect.
    pub fn shutdown(&mut self) {
        if self.state.is_closed() {
            return;
        }
        self.state = BridgeState::Closed;
        self.stt.close();
        info!(provider = self.stt.provider_name(), "Session bridge closed");
    }

    async fn send(&self, message: OutgoingMessage) {
        self.route(MessageRoute::Outgoing(message)).await;
    }

    async fn route(&self, route: MessageRoute) {
        if self.outgoing.send(route).await.is_err() {
            debug!("Client sender task has stopped, dropping outgoing message");
        }
    }
}
