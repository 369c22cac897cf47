use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::CoreState;
use crate::core::stt::STTError;

/// Application state that can be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    /// Core layer state holding the provider factory
    pub core_state: Arc<CoreState>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Arc<Self>, STTError> {
        let core_state = CoreState::new(&config)?;

        Ok(Arc::new(Self { config, core_state }))
    }
}
