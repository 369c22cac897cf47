//! JSON payloads carried inside Volcengine frames.
//!
//! - **Outgoing**: [`FullClientRequest`], sent once per session in a
//!   FULL_CLIENT_REQUEST frame.
//! - **Incoming**: [`ServerResponse`], the body of FULL_SERVER_RESPONSE frames.

use serde::{Deserialize, Deserializer, Serialize};

use super::config::VolcengineSTTConfig;
use crate::core::stt::base::{
    AUDIO_BITS_PER_SAMPLE, AUDIO_CHANNELS, AUDIO_SAMPLE_RATE, Utterance,
};

/// Status codes the service uses for success
pub const SUCCESS_CODES: [i64; 3] = [0, 1000, 20000000];

// =============================================================================
// Outgoing
// =============================================================================

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserInfo {
    pub uid: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AudioParams {
    pub format: &'static str,
    pub codec: &'static str,
    pub rate: u32,
    pub bits: u16,
    pub channel: u16,
}

impl Default for AudioParams {
    fn default() -> Self {
        Self {
            format: "pcm",
            codec: "raw",
            rate: AUDIO_SAMPLE_RATE,
            bits: AUDIO_BITS_PER_SAMPLE,
            channel: AUDIO_CHANNELS,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RequestParams {
    pub model_name: String,
    pub enable_itn: bool,
    pub enable_punc: bool,
    pub enable_ddc: bool,
    pub show_utterances: bool,
    /// "single" returns only newly recognised segments per response
    pub result_type: &'static str,
    pub vad_segment_duration: u32,
}

/// Session start request
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FullClientRequest {
    pub user: UserInfo,
    pub audio: AudioParams,
    pub request: RequestParams,
}

impl FullClientRequest {
    pub fn new(config: &VolcengineSTTConfig, uid: impl Into<String>) -> Self {
        Self {
            user: UserInfo { uid: uid.into() },
            audio: AudioParams::default(),
            request: RequestParams {
                model_name: config.model_name.clone(),
                enable_itn: config.enable_itn,
                enable_punc: config.enable_punc,
                enable_ddc: config.enable_ddc,
                show_utterances: config.show_utterances,
                result_type: "single",
                vad_segment_duration: config.vad_segment_duration_ms,
            },
        }
    }
}

// =============================================================================
// Incoming
// =============================================================================

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
pub struct RecognitionPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub utterances: Vec<Utterance>,
}

/// Treats an explicit `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
pub struct AudioInfo {
    /// Audio processed so far, in milliseconds
    #[serde(default)]
    pub duration: i64,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
pub struct ServerResponse {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<RecognitionPayload>,
    #[serde(default)]
    pub audio_info: Option<AudioInfo>,
    #[serde(default)]
    pub logid: Option<String>,
}

impl ServerResponse {
    /// Returns the failing status code, if the response carries one
    pub fn failure_code(&self) -> Option<i64> {
        self.code.filter(|code| !SUCCESS_CODES.contains(code))
    }
}
