pub mod state;
pub mod stt;

// Re-export commonly used types for convenience
pub use stt::{
    BaseSTT, STTConnectionState, STTError, STTEvent, STTProvider, STTProviderFactory, STTResult,
    get_supported_stt_providers,
};

// Re-export CoreState for external use
pub use state::CoreState;
