//! WebSocket error types and handling
//!
//! This module defines the errors a bridge reports to its client.

use thiserror::Error;

use crate::core::stt::STTError;

/// WebSocket handler error types
#[derive(Debug, Error)]
pub enum WebSocketError {
    /// The configured provider could not be constructed
    #[error("Failed to create speech recognition session: {0}")]
    ProviderCreation(STTError),

    /// The provider session failed to connect
    #[error("Failed to connect to speech recognition service: {0}")]
    ProviderConnection(STTError),

    /// Forwarding client audio to the provider failed
    #[error("Failed to process message: {0}")]
    AudioProcessing(STTError),

    /// The provider reported an error while streaming
    #[error("{0}")]
    Provider(STTError),
}

impl WebSocketError {
    /// Convert error to outgoing message format
    pub fn to_message(&self) -> String {
        self.to_string()
    }
}

/// Result type for WebSocket operations
pub type WebSocketResult<T> = Result<T, WebSocketError>;
