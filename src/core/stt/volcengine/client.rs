//! Volcengine streaming ASR WebSocket client.
//!
//! Implements [`BaseSTT`] on top of the binary frame codec in
//! [`super::protocol`]. Audio is forwarded as gzip-compressed
//! AUDIO_ONLY_REQUEST frames; results arrive as FULL_SERVER_RESPONSE frames.

use bytes::Bytes;
use futures::SinkExt;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::config::VolcengineSTTConfig;
use super::messages::{FullClientRequest, ServerResponse};
use super::protocol::{DecodedFrame, MessageType, decode_frame, encode_audio_frame, encode_control_frame};
use crate::core::stt::base::{
    BaseSTT, STTConnectionState, STTError, STTEvent, STTEventSender, STTResult,
};
use crate::core::stt::transport::{UpstreamLink, build_request, open_upstream};

pub const PROVIDER_NAME: &str = "volcengine";
pub const PROVIDER_INFO: &str = "Volcengine";

/// Volcengine streaming session.
///
/// One instance owns one upstream connection. The connect id doubles as the
/// session's task identifier.
pub struct VolcengineSTT {
    pub(crate) config: VolcengineSTTConfig,
    pub(crate) state: STTConnectionState,
    events: STTEventSender,
    link: Option<UpstreamLink>,
    connect_id: Option<String>,
}

impl VolcengineSTT {
    pub fn new(config: VolcengineSTTConfig, events: STTEventSender) -> Self {
        Self {
            config,
            state: STTConnectionState::Disconnected,
            events,
            link: None,
            connect_id: None,
        }
    }

    /// Authentication headers for the upgrade request.
    pub(crate) fn connection_headers<'a>(
        config: &'a VolcengineSTTConfig,
        connect_id: &'a str,
    ) -> [(&'static str, &'a str); 4] {
        [
            ("X-Api-App-Key", config.app_id.as_str()),
            ("X-Api-Access-Key", config.access_token.as_str()),
            ("X-Api-Resource-Id", config.resource_id.as_str()),
            ("X-Api-Connect-Id", connect_id),
        ]
    }

    /// Handle one inbound WebSocket message from the upstream.
    pub(crate) fn handle_websocket_message(message: Message, events: &STTEventSender) {
        match message {
            Message::Binary(data) => Self::handle_server_frame(&data, events),
            Message::Text(text) => {
                debug!("Ignoring text message from Volcengine: {}", text.as_str());
            }
            _ => {
                debug!("Received unexpected message type from Volcengine");
            }
        }
    }

    /// Decode one binary frame and emit the matching event, if any.
    pub(crate) fn handle_server_frame(data: &[u8], events: &STTEventSender) {
        let frame = match decode_frame(data) {
            Ok(DecodedFrame::Message(frame)) => frame,
            Ok(DecodedFrame::Error(err)) => {
                error!("Volcengine error response {}: {}", err.code, err.message);
                let _ = events.send(STTEvent::Error(STTError::ProviderError {
                    code: Some(i64::from(err.code)),
                    message: err.message,
                }));
                return;
            }
            Err(e) => {
                warn!("Failed to decode Volcengine frame: {}", e);
                let _ = events.send(STTEvent::Error(e.into()));
                return;
            }
        };

        if frame.header.message_type != MessageType::FullServerResponse {
            debug!(
                "Ignoring Volcengine frame of type {:?}",
                frame.header.message_type
            );
            return;
        }

        let Some(value) = frame.payload.as_json() else {
            debug!("Volcengine server response without JSON payload");
            return;
        };

        let response: ServerResponse = match serde_json::from_value(value.clone()) {
            Ok(response) => response,
            Err(e) => {
                let stt_error =
                    STTError::ProtocolError(format!("Unexpected Volcengine response shape: {e}"));
                warn!("{}", stt_error);
                let _ = events.send(STTEvent::Error(stt_error));
                return;
            }
        };

        if let Some(logid) = &response.logid {
            debug!("Volcengine logid: {}", logid);
        }

        if let Some(code) = response.failure_code() {
            let message = response
                .message
                .clone()
                .unwrap_or_else(|| "Volcengine reported a failure".to_string());
            error!("Volcengine status {}: {}", code, message);
            let _ = events.send(STTEvent::Error(STTError::ProviderError {
                code: Some(code),
                message,
            }));
            return;
        }

        if let Some(result) = response.result {
            let is_final = frame.is_final();
            debug!(
                "Volcengine result (seq {:?}, final: {}): {}",
                frame.sequence, is_final, result.text
            );
            let stt_result = STTResult::new(result.text, result.utterances, is_final);
            if events.send(STTEvent::Result(stt_result)).is_err() {
                warn!("Failed to send Volcengine result - channel closed");
            }
        }
    }

    async fn start_connection(&mut self) -> Result<(), STTError> {
        self.config.validate()?;

        let connect_id = Uuid::new_v4().to_string();
        let headers = Self::connection_headers(&self.config, &connect_id);
        let request = build_request(&self.config.ws_url, &headers)?;

        let mut stream = open_upstream(request).await?;
        info!("Connected to Volcengine ASR (connect id {})", connect_id);

        let uid = format!("web_client_{}", chrono::Utc::now().timestamp_millis());
        let start_request = FullClientRequest::new(&self.config, uid);
        let frame = encode_control_frame(&start_request)
            .map_err(|e| STTError::AudioProcessingError(format!("Failed to encode start request: {e}")))?;

        stream
            .send(Message::Binary(frame))
            .await
            .map_err(|e| STTError::TransportError(format!("Failed to send start request: {e}")))?;
        debug!("Sent Volcengine start request");

        let link = UpstreamLink::spawn(
            PROVIDER_INFO,
            stream,
            self.events.clone(),
            Self::handle_websocket_message,
        );

        self.link = Some(link);
        self.connect_id = Some(connect_id);
        Ok(())
    }
}

impl Drop for VolcengineSTT {
    fn drop(&mut self) {
        self.close();
    }
}

#[async_trait::async_trait]
impl BaseSTT for VolcengineSTT {
    async fn connect(&mut self) -> Result<(), STTError> {
        if self.is_ready() {
            warn!("Volcengine session already connected");
            return Ok(());
        }

        self.state = STTConnectionState::Connecting;
        match self.start_connection().await {
            Ok(()) => {
                self.state = STTConnectionState::Connected;
                Ok(())
            }
            Err(e) => {
                error!("Volcengine connect failed: {}", e);
                self.state = STTConnectionState::Error(e.to_string());
                Err(e)
            }
        }
    }

    fn send_audio(&mut self, audio_data: Bytes, is_last: bool) -> Result<(), STTError> {
        if !self.is_ready() {
            warn!("Volcengine session not connected, dropping {} bytes", audio_data.len());
            return Ok(());
        }

        if !is_last && audio_data.is_empty() {
            return Ok(());
        }

        let frame = encode_audio_frame(&audio_data, is_last)
            .map_err(|e| STTError::AudioProcessingError(format!("Failed to encode audio: {e}")))?;

        if let Some(link) = &self.link {
            link.send(Message::Binary(frame))?;
        }

        if is_last {
            info!("Sent end of stream to Volcengine");
        } else {
            debug!("Queued {} bytes of audio for Volcengine", audio_data.len());
        }
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut link) = self.link.take() {
            link.close();
            info!("Closed Volcengine session");
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
        self.connect_id.as_deref()
    }
}
