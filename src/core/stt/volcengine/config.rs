//! Configuration types for the Volcengine streaming ASR API.

use crate::core::stt::base::STTError;

/// Default streaming endpoint (bidirectional, async-optimised variant)
pub const DEFAULT_WS_URL: &str = "wss://openspeech.bytedance.com/api/v3/sauc/bigmodel_async";
/// Default billing resource: duration based streaming recognition
pub const DEFAULT_RESOURCE_ID: &str = "volc.bigasr.sauc.duration";
pub const DEFAULT_MODEL_NAME: &str = "bigmodel";
/// Silence, in milliseconds, after which the service closes a segment
pub const DEFAULT_VAD_SEGMENT_DURATION_MS: u32 = 1500;

/// Settings for one Volcengine session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolcengineSTTConfig {
    /// Application id, sent as `X-Api-App-Key`
    pub app_id: String,
    /// Access token, sent as `X-Api-Access-Key`
    pub access_token: String,
    /// Resource id, sent as `X-Api-Resource-Id`
    pub resource_id: String,
    pub ws_url: String,
    pub model_name: String,
    /// Inverse text normalization ("one hundred" -> "100")
    pub enable_itn: bool,
    pub enable_punc: bool,
    /// Disfluency removal
    pub enable_ddc: bool,
    pub show_utterances: bool,
    pub vad_segment_duration_ms: u32,
}

impl Default for VolcengineSTTConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            access_token: String::new(),
            resource_id: DEFAULT_RESOURCE_ID.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            enable_itn: true,
            enable_punc: true,
            enable_ddc: false,
            show_utterances: true,
            vad_segment_duration_ms: DEFAULT_VAD_SEGMENT_DURATION_MS,
        }
    }
}

impl VolcengineSTTConfig {
    pub fn new(app_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            access_token: access_token.into(),
            ..Default::default()
        }
    }

    pub fn with_ws_url(mut self, ws_url: impl Into<String>) -> Self {
        self.ws_url = ws_url.into();
        self
    }

    pub fn has_credentials(&self) -> bool {
        !self.app_id.is_empty() && !self.access_token.is_empty()
    }

    /// Checked before any transport activity.
    pub fn validate(&self) -> Result<(), STTError> {
        if !self.has_credentials() {
            return Err(STTError::AuthError(
                "Volcengine app id and access token are required".to_string(),
            ));
        }
        if self.ws_url.is_empty() {
            return Err(STTError::ConfigurationError(
                "Volcengine WebSocket URL is empty".to_string(),
            ));
        }
        Ok(())
    }
}
