use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::core::stt::{STTError, STTProvider, STTProviderFactory};

/// Core-specific shared state for the application.
///
/// Holds resources owned by the core layer. The provider factory carries the
/// Alibaba token cache, so one token is shared by every Alibaba session of
/// this process.
#[derive(Clone)]
pub struct CoreState {
    pub stt_factory: Arc<STTProviderFactory>,
}

impl CoreState {
    pub fn new(config: &ServerConfig) -> Result<Arc<Self>, STTError> {
        let stt_factory = STTProviderFactory::from_config(config)?;
        let default_provider = stt_factory.default_provider();

        match default_provider {
            STTProvider::Volcengine if !config.has_volcengine_credentials() => {
                warn!("Volcengine credentials are incomplete: set VOLCENGINE_APP_ID and VOLCENGINE_TOKEN");
            }
            STTProvider::Alibaba if !config.has_alibaba_credentials() => {
                warn!(
                    "Alibaba configuration is incomplete: set ALIBABA_APP_KEY, ALIBABA_ACCESS_KEY_ID and ALIBABA_ACCESS_KEY_SECRET"
                );
            }
            _ => {}
        }

        info!("Default ASR provider: {}", default_provider);

        Ok(Arc::new(Self {
            stt_factory: Arc::new(stt_factory),
        }))
    }
}
