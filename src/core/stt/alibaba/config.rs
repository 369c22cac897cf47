//! Configuration types for Alibaba Cloud NLS real-time transcription.

use crate::core::stt::base::STTError;

pub const DEFAULT_REGION: &str = "cn-shanghai";
/// POP API version of the CreateToken action
pub const TOKEN_API_VERSION: &str = "2019-02-28";

/// Gateway URL for a region
pub fn default_ws_url(region: &str) -> String {
    format!("wss://nls-gateway.{region}.aliyuncs.com/ws/v1")
}

/// Token service endpoint for a region
pub fn default_meta_endpoint(region: &str) -> String {
    format!("https://nls-meta.{region}.aliyuncs.com")
}

/// AccessKey pair used to sign token requests
#[derive(Clone, PartialEq, Eq)]
pub struct AlibabaCredentials {
    pub access_key_id: String,
    pub access_key_secret: String,
}

impl AlibabaCredentials {
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.access_key_id.is_empty() && !self.access_key_secret.is_empty()
    }
}

impl std::fmt::Debug for AlibabaCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlibabaCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .finish()
    }
}

/// Settings for one Alibaba transcription session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlibabaSTTConfig {
    /// Project appkey from the NLS console
    pub app_key: String,
    pub ws_url: String,
    pub enable_intermediate_result: bool,
    pub enable_punctuation_prediction: bool,
    pub enable_inverse_text_normalization: bool,
}

impl Default for AlibabaSTTConfig {
    fn default() -> Self {
        Self {
            app_key: String::new(),
            ws_url: default_ws_url(DEFAULT_REGION),
            enable_intermediate_result: true,
            enable_punctuation_prediction: true,
            enable_inverse_text_normalization: true,
        }
    }
}

impl AlibabaSTTConfig {
    pub fn new(app_key: impl Into<String>, ws_url: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            ws_url: ws_url.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), STTError> {
        if self.app_key.is_empty() {
            return Err(STTError::AuthError("Alibaba appkey is required".to_string()));
        }
        if self.ws_url.is_empty() {
            return Err(STTError::ConfigurationError(
                "Alibaba WebSocket URL is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Gateway URL with the appkey and token query parameters
    pub fn connection_url(&self, token: &str) -> Result<String, STTError> {
        let mut url = url::Url::parse(&self.ws_url).map_err(|e| {
            STTError::ConfigurationError(format!("Invalid Alibaba WebSocket URL {}: {e}", self.ws_url))
        })?;
        url.query_pairs_mut()
            .append_pair("appkey", &self.app_key)
            .append_pair("token", token);
        Ok(url.into())
    }
}
