//! Configuration module for the voxbridge server
//!
//! This module handles server configuration from various sources: YAML files and
//! environment variables. The configuration is split into logical submodules.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use voxbridge::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file, falling back to environment variables
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use crate::core::stt::alibaba::{DEFAULT_REGION, default_meta_endpoint, default_ws_url};
use crate::core::stt::volcengine::{DEFAULT_RESOURCE_ID, DEFAULT_WS_URL};

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

pub use utils::parse_list;

/// Server configuration
///
/// Contains everything needed to run the bridge:
/// - Server settings (host, port, CORS)
/// - The default ASR provider
/// - Per-provider credentials and endpoints
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // Provider selection
    pub asr_provider: String,

    // Volcengine settings
    pub volcengine_app_id: String,
    pub volcengine_access_token: String,
    pub volcengine_resource_id: String,
    pub volcengine_ws_url: String,

    // Alibaba settings
    pub alibaba_app_key: String,
    pub alibaba_access_key_id: String,
    pub alibaba_access_key_secret: String,
    pub alibaba_region: String,
    pub alibaba_ws_url: String,
    pub alibaba_meta_endpoint: String,

    // CORS: permissive when None
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            asr_provider: "volcengine".to_string(),
            volcengine_app_id: String::new(),
            volcengine_access_token: String::new(),
            volcengine_resource_id: DEFAULT_RESOURCE_ID.to_string(),
            volcengine_ws_url: DEFAULT_WS_URL.to_string(),
            alibaba_app_key: String::new(),
            alibaba_access_key_id: String::new(),
            alibaba_access_key_secret: String::new(),
            alibaba_region: DEFAULT_REGION.to_string(),
            alibaba_ws_url: default_ws_url(DEFAULT_REGION),
            alibaba_meta_endpoint: default_meta_endpoint(DEFAULT_REGION),
            cors_allowed_origins: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable fallback
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables
    /// 3. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // .env is not loaded here: the YAML file is the source of truth and only
        // real environment variables fill its gaps.
        let yaml_config = yaml::YamlConfig::from_file(path)?;

        let config = merge::merge_config(Some(yaml_config))?;

        validation::validate_provider(&config.asr_provider)?;
        validation::validate_port(config.port)?;

        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn has_volcengine_credentials(&self) -> bool {
        !self.volcengine_app_id.is_empty() && !self.volcengine_access_token.is_empty()
    }

    pub fn has_alibaba_credentials(&self) -> bool {
        !self.alibaba_app_key.is_empty()
            && !self.alibaba_access_key_id.is_empty()
            && !self.alibaba_access_key_secret.is_empty()
    }
}
