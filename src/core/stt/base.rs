use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Sample rate of the PCM audio accepted from clients, in Hz
pub const AUDIO_SAMPLE_RATE: u32 = 16000;
/// Bits per PCM sample (signed, little-endian)
pub const AUDIO_BITS_PER_SAMPLE: u16 = 16;
/// Number of audio channels (mono)
pub const AUDIO_CHANNELS: u16 = 1;

/// A provider-identified speech segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    /// Text of this segment
    #[serde(default)]
    pub text: String,
    /// Segment start, in milliseconds from the beginning of the stream
    #[serde(rename = "start_time", default)]
    pub start_time_ms: i64,
    /// Segment end, in milliseconds from the beginning of the stream
    #[serde(rename = "end_time", default)]
    pub end_time_ms: i64,
    /// Whether the provider has finalized this segment
    #[serde(rename = "definite", default)]
    pub is_definite: bool,
}

/// Recognition result emitted by a provider session
///
/// Serializes to the shape relayed verbatim to clients:
/// `{"text": "...", "utterances": [...], "isFinal": bool}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct STTResult {
    /// Full recognized text for the current hypothesis
    pub text: String,
    /// Per-segment details, empty when the provider does not report them
    #[serde(default)]
    pub utterances: Vec<Utterance>,
    /// Whether this is a final result (not an interim hypothesis)
    #[serde(rename = "isFinal")]
    pub is_final: bool,
}

impl STTResult {
    /// Creates a new STTResult
    pub fn new(text: impl Into<String>, utterances: Vec<Utterance>, is_final: bool) -> Self {
        Self {
            text: text.into(),
            utterances,
            is_final,
        }
    }

    /// Interim hypothesis without segment details
    pub fn interim(text: impl Into<String>) -> Self {
        Self::new(text, Vec::new(), false)
    }

    /// Final result without segment details
    pub fn final_text(text: impl Into<String>) -> Self {
        Self::new(text, Vec::new(), true)
    }
}

/// Error types for STT operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum STTError {
    /// Socket failure before or during streaming
    #[error("Transport error: {0}")]
    TransportError(String),
    /// Truncated frame, bad length, corrupt gzip or bad JSON
    #[error("Protocol error: {0}")]
    ProtocolError(String),
    /// Token acquisition or credential failure
    #[error("Authentication failed: {0}")]
    AuthError(String),
    /// Unknown provider or invalid provider settings
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    /// Local failure while preparing audio for transmission
    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),
    /// Failure reported by the upstream service itself
    #[error("{}", describe_provider_error(*.code, .message))]
    ProviderError { code: Option<i64>, message: String },
}

fn describe_provider_error(code: Option<i64>, message: &str) -> String {
    match code {
        Some(code) => format!("Provider error {code}: {message}"),
        None => format!("Provider error: {message}"),
    }
}

impl STTError {
    /// Upstream error code, when the provider reported one
    pub fn code(&self) -> Option<i64> {
        match self {
            STTError::ProviderError { code, .. } => *code,
            _ => None,
        }
    }
}

/// Details of an upstream transport closure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseInfo {
    pub code: Option<u16>,
    pub reason: String,
}

/// Tagged event emitted by a provider session, in transport order
#[derive(Debug, Clone, PartialEq)]
pub enum STTEvent {
    Result(STTResult),
    Error(STTError),
    Close(CloseInfo),
}

pub type STTEventSender = mpsc::UnboundedSender<STTEvent>;
pub type STTEventReceiver = mpsc::UnboundedReceiver<STTEvent>;

/// Creates the ordered event stream shared by a provider session and its consumer
pub fn event_channel() -> (STTEventSender, STTEventReceiver) {
    mpsc::unbounded_channel()
}

/// Connection state for STT providers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum STTConnectionState {
    /// Not connected
    Disconnected,
    /// In the process of connecting
    Connecting,
    /// Connected and ready to receive audio
    Connected,
    /// Connect attempt failed
    Error(String),
}

/// Base trait for streaming speech recognition provider sessions
///
/// One instance owns exactly one upstream connection. Results, errors and the
/// final close notification are delivered on the event sender supplied when
/// the session was constructed.
#[async_trait::async_trait]
pub trait BaseSTT: Send + Sync {
    /// Open the upstream connection and send the provider's start request.
    ///
    /// Resolves only once the start request has been written. On failure no
    /// events are emitted.
    async fn connect(&mut self) -> Result<(), STTError>;

    /// Queue audio for the provider.
    ///
    /// A no-op when not connected. `is_last` signals end-of-stream and always
    /// produces exactly one end-of-stream transmission. Never blocks.
    fn send_audio(&mut self, audio_data: Bytes, is_last: bool) -> Result<(), STTError>;

    /// Close the upstream connection. Safe to call any number of times.
    fn close(&mut self);

    /// Check if the connection is ready to be used
    fn is_ready(&self) -> bool;

    /// Canonical provider name, as accepted by the factory
    fn provider_name(&self) -> &'static str;

    /// Human readable provider description
    fn get_provider_info(&self) -> &'static str;

    /// Identifier of the current upstream task, once connected
    fn task_id(&self) -> Option<&str>;
}
