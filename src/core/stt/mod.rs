pub mod alibaba;
mod base;
pub mod transport;
pub mod volcengine;

use std::sync::Arc;

// Re-export public types and traits
pub use base::{
    AUDIO_BITS_PER_SAMPLE, AUDIO_CHANNELS, AUDIO_SAMPLE_RATE, BaseSTT, CloseInfo,
    STTConnectionState, STTError, STTEvent, STTEventReceiver, STTEventSender, STTResult,
    Utterance, event_channel,
};

// Re-export Volcengine implementation
pub use volcengine::{VolcengineSTT, VolcengineSTTConfig};

// Re-export Alibaba implementation
pub use alibaba::{AlibabaCredentials, AlibabaSTT, AlibabaSTTConfig, AlibabaTokenManager};

use crate::config::ServerConfig;

/// Supported STT providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum STTProvider {
    /// Volcengine bigmodel streaming ASR (binary framed protocol)
    Volcengine,
    /// Alibaba Cloud NLS real-time transcription (token gated JSON protocol)
    Alibaba,
}

impl STTProvider {
    /// All providers, in discovery order
    pub const ALL: [STTProvider; 2] = [STTProvider::Volcengine, STTProvider::Alibaba];

    /// Human readable provider name
    pub fn display_name(&self) -> &'static str {
        match self {
            STTProvider::Volcengine => volcengine::PROVIDER_INFO,
            STTProvider::Alibaba => alibaba::PROVIDER_INFO,
        }
    }
}

impl std::fmt::Display for STTProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            STTProvider::Volcengine => write!(f, "{}", volcengine::PROVIDER_NAME),
            STTProvider::Alibaba => write!(f, "{}", alibaba::PROVIDER_NAME),
        }
    }
}

impl std::str::FromStr for STTProvider {
    type Err = STTError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "volcengine" => Ok(STTProvider::Volcengine),
            "alibaba" => Ok(STTProvider::Alibaba),
            _ => Err(STTError::ConfigurationError(format!(
                "Unsupported STT provider: {s}. Supported providers: {}",
                get_supported_stt_providers().join(", ")
            ))),
        }
    }
}

/// Get a list of all supported STT providers
///
/// # Examples
/// ```rust
/// use voxbridge::core::stt::get_supported_stt_providers;
///
/// let providers = get_supported_stt_providers();
/// assert_eq!(providers, vec!["volcengine", "alibaba"]);
/// ```
pub fn get_supported_stt_providers() -> Vec<&'static str> {
    vec![volcengine::PROVIDER_NAME, alibaba::PROVIDER_NAME]
}

/// Builds provider sessions by name.
///
/// Holds the per-provider settings and the shared Alibaba token cache so each
/// new session is constructed from injected values only.
pub struct STTProviderFactory {
    default_provider: STTProvider,
    volcengine: VolcengineSTTConfig,
    alibaba: AlibabaSTTConfig,
    alibaba_tokens: Arc<AlibabaTokenManager>,
}

impl STTProviderFactory {
    pub fn new(
        default_provider: STTProvider,
        volcengine: VolcengineSTTConfig,
        alibaba: AlibabaSTTConfig,
        alibaba_tokens: Arc<AlibabaTokenManager>,
    ) -> Self {
        Self {
            default_provider,
            volcengine,
            alibaba,
            alibaba_tokens,
        }
    }

    /// Factory wired from the server configuration
    pub fn from_config(config: &ServerConfig) -> Result<Self, STTError> {
        let default_provider: STTProvider = config.asr_provider.parse()?;

        let volcengine = VolcengineSTTConfig {
            app_id: config.volcengine_app_id.clone(),
            access_token: config.volcengine_access_token.clone(),
            resource_id: config.volcengine_resource_id.clone(),
            ws_url: config.volcengine_ws_url.clone(),
            ..Default::default()
        };

        let alibaba = AlibabaSTTConfig::new(
            config.alibaba_app_key.clone(),
            config.alibaba_ws_url.clone(),
        );

        let alibaba_tokens = Arc::new(AlibabaTokenManager::new(
            AlibabaCredentials::new(
                config.alibaba_access_key_id.clone(),
                config.alibaba_access_key_secret.clone(),
            ),
            config.alibaba_region.clone(),
            config.alibaba_meta_endpoint.clone(),
        ));

        Ok(Self::new(default_provider, volcengine, alibaba, alibaba_tokens))
    }

    pub fn default_provider(&self) -> STTProvider {
        self.default_provider
    }

    /// Create a session for `provider`, or for the default provider when `None`.
    ///
    /// Unknown names fail with [`STTError::ConfigurationError`] before any
    /// transport activity.
    pub fn create(
        &self,
        provider: Option<&str>,
        events: STTEventSender,
    ) -> Result<Box<dyn BaseSTT>, STTError> {
        let provider = match provider {
            Some(name) => name.parse()?,
            None => self.default_provider,
        };
        Ok(self.create_from_enum(provider, events))
    }

    pub fn create_from_enum(&self, provider: STTProvider, events: STTEventSender) -> Box<dyn BaseSTT> {
        match provider {
            STTProvider::Volcengine => Box::new(VolcengineSTT::new(self.volcengine.clone(), events)),
            STTProvider::Alibaba => Box::new(AlibabaSTT::new(
                self.alibaba.clone(),
                self.alibaba_tokens.clone(),
                events,
            )),
        }
    }
}
