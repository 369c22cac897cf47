//! JSON commands and events of the NLS SpeechTranscriber protocol.
//!
//! Every message is `{header: {...}, payload: {...}}`. Audio itself travels
//! as raw binary frames and never appears here.

use serde::{Deserialize, Serialize};

use super::config::AlibabaSTTConfig;
use crate::core::stt::base::AUDIO_SAMPLE_RATE;

pub const NAMESPACE: &str = "SpeechTranscriber";
pub const START_TRANSCRIPTION: &str = "StartTranscription";
pub const STOP_TRANSCRIPTION: &str = "StopTranscription";
pub const TRANSCRIPTION_RESULT_CHANGED: &str = "TranscriptionResultChanged";
pub const TRANSCRIPTION_COMPLETED: &str = "TranscriptionCompleted";
/// Status reported on every successful event
pub const SUCCESS_STATUS: i64 = 20000000;

/// 32-character hex identifier (UUID v4 without dashes)
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

// =============================================================================
// Outgoing Commands
// =============================================================================

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CommandHeader {
    pub message_id: String,
    pub task_id: String,
    pub namespace: &'static str,
    pub name: &'static str,
    pub appkey: String,
}

impl CommandHeader {
    fn new(name: &'static str, task_id: &str, app_key: &str) -> Self {
        Self {
            message_id: generate_id(),
            task_id: task_id.to_string(),
            namespace: NAMESPACE,
            name,
            appkey: app_key.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StartPayload {
    pub format: &'static str,
    pub sample_rate: u32,
    pub enable_intermediate_result: bool,
    pub enable_punctuation_prediction: bool,
    pub enable_inverse_text_normalization: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StartTranscription {
    pub header: CommandHeader,
    pub payload: StartPayload,
}

impl StartTranscription {
    pub fn new(config: &AlibabaSTTConfig, task_id: &str) -> Self {
        Self {
            header: CommandHeader::new(START_TRANSCRIPTION, task_id, &config.app_key),
            payload: StartPayload {
                format: "pcm",
                sample_rate: AUDIO_SAMPLE_RATE,
                enable_intermediate_result: config.enable_intermediate_result,
                enable_punctuation_prediction: config.enable_punctuation_prediction,
                enable_inverse_text_normalization: config.enable_inverse_text_normalization,
            },
        }
    }
}

/// End-of-stream command. Carries no payload.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StopTranscription {
    pub header: CommandHeader,
}

impl StopTranscription {
    pub fn new(task_id: &str, app_key: &str) -> Self {
        Self {
            header: CommandHeader::new(STOP_TRANSCRIPTION, task_id, app_key),
        }
    }
}

// =============================================================================
// Incoming Events
// =============================================================================

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
pub struct EventHeader {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub status_text: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
pub struct EventPayload {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub index: Option<i64>,
    #[serde(default)]
    pub time: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerEvent {
    pub header: EventHeader,
    #[serde(default)]
    pub payload: Option<EventPayload>,
}

impl ServerEvent {
    /// Parse a text frame. Anything that is not a JSON object is `None`.
    pub fn parse(text: &str) -> Option<Self> {
        if !text.trim_start().starts_with('{') {
            return None;
        }
        serde_json::from_str(text).ok()
    }

    /// Events without a status are treated as successful
    pub fn is_failure(&self) -> bool {
        self.header
            .status
            .is_some_and(|status| status != SUCCESS_STATUS)
    }

    /// Recognised text, when present and non-empty
    pub fn result_text(&self) -> Option<&str> {
        self.payload
            .as_ref()
            .and_then(|payload| payload.result.as_deref())
            .filter(|text| !text.is_empty())
    }
}
