//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check and provider discovery endpoints
//! - `ws` - WebSocket speech recognition bridge

pub mod api;
pub mod ws;

// Re-export commonly used handlers for convenient access
pub use ws::ws_asr_handler;
