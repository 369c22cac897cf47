use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// Every field is optional so a file may configure only the parts it cares
/// about. Missing values fall back to environment variables, then defaults.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3001
///
/// asr:
///   provider: "volcengine"
///
/// volcengine:
///   app_id: "your-app-id"
///   access_token: "your-access-token"
///   resource_id: "volc.bigasr.sauc.duration"
///   ws_url: "wss://openspeech.bytedance.com/api/v3/sauc/bigmodel_async"
///
/// alibaba:
///   app_key: "your-app-key"
///   access_key_id: "your-access-key-id"
///   access_key_secret: "your-access-key-secret"
///   region: "cn-shanghai"
///
/// cors:
///   allowed_origins:
///     - "http://localhost:5173"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub asr: Option<AsrYaml>,
    pub volcengine: Option<VolcengineYaml>,
    pub alibaba: Option<AlibabaYaml>,
    pub cors: Option<CorsYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Provider selection from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AsrYaml {
    pub provider: Option<String>,
}

/// Volcengine credentials and endpoint from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct VolcengineYaml {
    pub app_id: Option<String>,
    pub access_token: Option<String>,
    pub resource_id: Option<String>,
    pub ws_url: Option<String>,
}

/// Alibaba credentials and endpoints from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AlibabaYaml {
    pub app_key: Option<String>,
    pub access_key_id: Option<String>,
    pub access_key_secret: Option<String>,
    /// Region used to derive `ws_url` and `meta_endpoint` when they are not set
    pub region: Option<String>,
    pub ws_url: Option<String>,
    pub meta_endpoint: Option<String>,
}

/// CORS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CorsYaml {
    pub allowed_origins: Option<Vec<String>>,
}

impl YamlConfig {
    /// Load YAML configuration from a file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid YAML
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
