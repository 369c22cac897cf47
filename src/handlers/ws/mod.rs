//! # WebSocket ASR Bridge Module
//!
//! This module exposes a WebSocket endpoint that streams browser audio to the
//! configured speech recognition provider and relays recognition results back.
//!
//! ## WebSocket API
//!
//! ### Connection Flow
//! 1. Client connects to `/ws/asr`
//! 2. Server creates a provider session and connects it upstream
//! 3. Server sends `{"type": "connected", "message": "..."}` once the provider is ready,
//!    or `{"type": "error", "error": "..."}` followed by a close frame when it is not
//! 4. Client streams binary PCM frames (16-bit signed, mono, 16000 Hz)
//! 5. Client sends `{"type": "end"}` when recording stops
//! 6. Server relays results until the client disconnects
//!
//! ### Message Types
//!
//! **Incoming Messages:**
//! - **Binary messages** - Raw PCM audio
//! - `{"type": "end"}` - Last audio packet marker
//!
//! Any frame that is not exactly the end marker is forwarded as audio, including
//! frames that start with `{` but are not valid JSON.
//!
//! **Outgoing Messages:**
//! - `{"type": "connected", "message": "..."}` - Provider session is ready
//! - `{"type": "result", "data": {"text": "...", "utterances": [...], "isFinal": false}}` - Recognition result
//! - `{"type": "error", "error": "..."}` - Error occurred; streaming continues unless connecting failed
//!
//! ## JavaScript Client Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:3001/ws/asr');
//! ws.binaryType = 'arraybuffer';
//!
//! ws.onmessage = (event) => {
//!   const message = JSON.parse(event.data);
//!   switch (message.type) {
//!     case 'connected':
//!       startRecording((pcmChunk) => ws.send(pcmChunk));
//!       break;
//!     case 'result':
//!       render(message.data.text, message.data.isFinal);
//!       break;
//!     case 'error':
//!       console.error(message.error);
//!       break;
//!   }
//! };
//!
//! function stop() {
//!   ws.send(JSON.stringify({ type: 'end' }));
//! }
//! ```

pub mod bridge;
pub mod error;
pub mod handler;
pub mod messages;
pub mod state;

#[cfg(test)]
mod tests;

// Re-export commonly used items
pub use bridge::SessionBridge;
pub use handler::ws_asr_handler;
pub use messages::{ClientInput, MessageRoute, OutgoingMessage};
pub use state::BridgeState;
