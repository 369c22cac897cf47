//! Alibaba Cloud Intelligent Speech Interaction (NLS) real-time transcription.
//!
//! - [`config`]: appkey, gateway URL and recognition switches
//! - [`token`]: signed `CreateToken` calls and the token cache
//! - [`messages`]: SpeechTranscriber JSON commands and events
//! - [`client`]: the [`AlibabaSTT`] session implementing `BaseSTT`

mod client;
mod config;
mod messages;
mod token;


pub use client::{AlibabaSTT, PROVIDER_INFO, PROVIDER_NAME};
pub use config::{
    AlibabaCredentials, AlibabaSTTConfig, DEFAULT_REGION, default_meta_endpoint, default_ws_url,
};
pub use messages::{ServerEvent, StartTranscription, StopTranscription};
pub use token::{AlibabaTokenManager, CachedToken, pop_signature};
