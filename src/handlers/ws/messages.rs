//! WebSocket message types and routing
//!
//! Outgoing messages are JSON text frames tagged by `type`. Incoming frames
//! are either raw PCM audio or the `{"type":"end"}` control message.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::core::stt::STTResult;

/// Opening byte of a JSON object, the only shape a control message can take
const JSON_OBJECT_START: u8 = b'{';

/// WebSocket message types for outgoing messages
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum OutgoingMessage {
    #[serde(rename = "connected")]
    Connected { message: String },
    #[serde(rename = "result")]
    Result { data: STTResult },
    #[serde(rename = "error")]
    Error { error: String },
}

/// Control message sent by the client as a JSON text frame
#[derive(Debug, Deserialize)]
pub struct ControlMessage {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl ControlMessage {
    pub fn is_end(&self) -> bool {
        self.kind.as_deref() == Some("end")
    }
}

/// Classified client frame
#[derive(Debug, Clone, PartialEq)]
pub enum ClientInput {
    /// Raw PCM to forward upstream
    Audio(Bytes),
    /// `{"type":"end"}`: the client finished recording
    EndOfStream,
}

impl ClientInput {
    /// Classify a client frame by content, regardless of the frame opcode
    ///
    /// Only a payload that starts with `{`, parses as JSON and has
    /// `type == "end"` is a control message. Everything else, including JSON
    /// with another type and bytes that merely start with `{`, is audio.
    pub fn classify(data: Bytes) -> Self {
        if data.first() == Some(&JSON_OBJECT_START)
            && let Ok(control) = serde_json::from_slice::<ControlMessage>(&data)
            && control.is_end()
        {
            return ClientInput::EndOfStream;
        }
        ClientInput::Audio(data)
    }
}

/// Message routing for the outgoing sender task
#[derive(Debug, Clone, PartialEq)]
pub enum MessageRoute {
    Outgoing(OutgoingMessage),
    /// Send a Close frame and stop the sender task
    Close,
}
