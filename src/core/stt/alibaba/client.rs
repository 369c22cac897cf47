//! Alibaba Cloud NLS real-time transcription WebSocket client.
//!
//! Control traffic is JSON text; audio is sent as raw PCM binary frames with
//! no framing or compression. Access requires a token obtained from the
//! shared [`AlibabaTokenManager`].

use std::sync::Arc;

use bytes::Bytes;
use futures::SinkExt;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, error, info, warn};

use super::config::AlibabaSTTConfig;
use super::messages::{
    ServerEvent, StartTranscription, StopTranscription, TRANSCRIPTION_COMPLETED,
    TRANSCRIPTION_RESULT_CHANGED, generate_id,
};
use super::token::AlibabaTokenManager;
use crate::core::stt::base::{
    BaseSTT, STTConnectionState, STTError, STTEvent, STTEventSender, STTResult,
};
use crate::core::stt::transport::{UpstreamLink, build_request, open_upstream};

pub const PROVIDER_NAME: &str = "alibaba";
pub const PROVIDER_INFO: &str = "Alibaba Cloud";

/// Alibaba transcription session.
pub struct AlibabaSTT {
    pub(crate) config: AlibabaSTTConfig,
    pub(crate) state: STTConnectionState,
    tokens: Arc<AlibabaTokenManager>,
    events: STTEventSender,
    link: Option<UpstreamLink>,
    task_id: Option<String>,
}

impl AlibabaSTT {
    pub fn new(
        config: AlibabaSTTConfig,
        tokens: Arc<AlibabaTokenManager>,
        events: STTEventSender,
    ) -> Self {
        Self {
            config,
            state: STTConnectionState::Disconnected,
            tokens,
            events,
            link: None,
            task_id: None,
        }
    }

    /// Handle one inbound WebSocket message from the gateway.
    ///
    /// Only JSON objects are interpreted. Heartbeats and other noise are
    /// dropped silently.
    pub(crate) fn handle_websocket_message(message: Message, events: &STTEventSender) {
        let text = match &message {
            Message::Text(text) => text.as_str(),
            Message::Binary(data) => match std::str::from_utf8(data) {
                Ok(text) => text,
                Err(_) => return,
            },
            _ => return,
        };

        let Some(event) = ServerEvent::parse(text) else {
            debug!("Ignoring non-JSON message from Alibaba");
            return;
        };

        if event.is_failure() {
            let status_text = event
                .header
                .status_text
                .clone()
                .unwrap_or_else(|| "unknown error".to_string());
            error!(
                "Alibaba error {:?} on {}: {}",
                event.header.status, event.header.name, status_text
            );
            let _ = events.send(STTEvent::Error(STTError::ProviderError {
                code: event.header.status,
                message: format!("Alibaba Cloud error: {status_text}"),
            }));
            return;
        }

        let is_final = match event.header.name.as_str() {
            TRANSCRIPTION_RESULT_CHANGED => false,
            TRANSCRIPTION_COMPLETED => true,
            other => {
                debug!("Alibaba event {}", other);
                return;
            }
        };

        if let Some(text) = event.result_text() {
            debug!("Alibaba result (final: {}): {}", is_final, text);
            let result = if is_final {
                STTResult::final_text(text)
            } else {
                STTResult::interim(text)
            };
            if events.send(STTEvent::Result(result)).is_err()
            {
                warn!("Failed to send Alibaba result - channel closed");
            }
        }
    }

    async fn start_connection(&mut self) -> Result<(), STTError> {
        self.config.validate()?;

        let token = self.tokens.get_token().await?;
        let task_id = generate_id();
        let url = self.config.connection_url(&token)?;
        let request = build_request(&url, &[])?;

        let mut stream = open_upstream(request).await?;
        info!("Connected to Alibaba NLS gateway (task id {})", task_id);

        let start = StartTranscription::new(&self.config, &task_id);
        let json = serde_json::to_string(&start)
            .map_err(|e| STTError::ProtocolError(format!("Failed to encode start command: {e}")))?;

        stream
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| STTError::TransportError(format!("Failed to send start command: {e}")))?;
        debug!("Sent Alibaba StartTranscription");

        let link = UpstreamLink::spawn(
            PROVIDER_INFO,
            stream,
            self.events.clone(),
            Self::handle_websocket_message,
        );

        self.link = Some(link);
        self.task_id = Some(task_id);
        Ok(())
    }
}

impl Drop for AlibabaSTT {
    fn drop(&mut self) {
        self.close();
    }
}

#[async_trait::async_trait]
impl BaseSTT for AlibabaSTT {
    async fn connect(&mut self) -> Result<(), STTError> {
        if self.is_ready() {
            warn!("Alibaba session already connected");
            return Ok(());
        }

        self.state = STTConnectionState::Connecting;
        match self.start_connection().await {
            Ok(()) => {
                self.state = STTConnectionState::Connected;
                Ok(())
            }
            Err(e) => {
                error!("Alibaba connect failed: {}", e);
                self.state = STTConnectionState::Error(e.to_string());
                Err(e)
            }
        }
    }

    fn send_audio(&mut self, audio_data: Bytes, is_last: bool) -> Result<(), STTError> {
        if !self.is_ready() {
            warn!("Alibaba session not connected, dropping {} bytes", audio_data.len());
            return Ok(());
        }

        let (Some(link), Some(task_id)) = (&self.link, &self.task_id) else {
            return Ok(());
        };

        if is_last {
            let stop = StopTranscription::new(task_id, &self.config.app_key);
            let json = serde_json::to_string(&stop).map_err(|e| {
                STTError::AudioProcessingError(format!("Failed to encode stop command: {e}"))
            })?;
            link.send(Message::Text(json.into()))?;
            info!("Sent Alibaba StopTranscription");
        } else if !audio_data.is_empty() {
            let len = audio_data.len();
            link.send(Message::Binary(audio_data))?;
            debug!("Queued {} bytes of audio for Alibaba", len);
        }
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut link) = self.link.take() {
            link.close();
            info!("Closed Alibaba session");
        }
        self.state = STTConnectionState::Disconnected;
    }

    fn is_ready(&self) -> bool {
        matches!(self.state, STTConnectionState::Connected)
            && self.link.as_ref().is_some_and(|link| link.is_open())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn get_provider_info(&self) -> &'static str {
        PROVIDER_INFO
    }

    fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }
}
