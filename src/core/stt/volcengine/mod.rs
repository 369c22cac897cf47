//! Volcengine (ByteDance) "bigmodel" streaming speech recognition.
//!
//! - [`protocol`]: binary frame codec (header, sequence, length, gzip payload)
//! - [`config`]: credentials and recognition options
//! - [`messages`]: JSON bodies of the start request and server responses
//! - [`client`]: the [`VolcengineSTT`] session implementing `BaseSTT`

mod client;
mod config;
mod messages;
pub mod protocol;


pub use client::{PROVIDER_INFO, PROVIDER_NAME, VolcengineSTT};
pub use config::{DEFAULT_RESOURCE_ID, DEFAULT_WS_URL, VolcengineSTTConfig};
pub use messages::{FullClientRequest, RecognitionPayload, ServerResponse};
