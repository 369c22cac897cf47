use std::env;

use super::ServerConfig;
use super::utils::parse_list;
use super::yaml::YamlConfig;
use crate::core::stt::alibaba::{DEFAULT_REGION, default_meta_endpoint, default_ws_url};
use crate::core::stt::volcengine::{DEFAULT_RESOURCE_ID, DEFAULT_WS_URL};

/// Merge YAML configuration with environment variables
///
/// Priority order (highest to lowest):
/// 1. YAML configuration values
/// 2. Environment variables
/// 3. Default values
///
/// The Alibaba gateway and token endpoints are derived from the merged region
/// unless one of the sources sets them explicitly.
pub fn merge_config(
    yaml_config: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let yaml = yaml_config.unwrap_or_default();

    // Helper macro to get value with priority: YAML > ENV > Default
    macro_rules! get_value {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            $yaml_value
                .or_else(|| env::var($env_var).ok())
                .unwrap_or_else(|| $default.to_string())
        };
    }

    // Helper macro for values whose default is the empty string
    macro_rules! get_secret {
        ($env_var:expr, $yaml_value:expr) => {
            $yaml_value
                .or_else(|| env::var($env_var).ok())
                .unwrap_or_default()
        };
    }

    // Server configuration
    let host = get_value!(
        "HOST",
        yaml.server.as_ref().and_then(|s| s.host.clone()),
        "0.0.0.0"
    );

    let port = if let Some(yaml_port) = yaml.server.as_ref().and_then(|s| s.port) {
        yaml_port
    } else if let Ok(port_str) = env::var("PORT") {
        port_str
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT environment variable: {e}"))?
    } else {
        3001
    };

    let asr_provider = get_value!(
        "ASR_PROVIDER",
        yaml.asr.as_ref().and_then(|a| a.provider.clone()),
        "volcengine"
    );

    // Volcengine configuration
    let volcengine = yaml.volcengine.as_ref();
    let volcengine_app_id = get_secret!(
        "VOLCENGINE_APP_ID",
        volcengine.and_then(|v| v.app_id.clone())
    );
    let volcengine_access_token = get_secret!(
        "VOLCENGINE_TOKEN",
        volcengine.and_then(|v| v.access_token.clone())
    );
    let volcengine_resource_id = get_value!(
        "VOLCENGINE_RESOURCE_ID",
        volcengine.and_then(|v| v.resource_id.clone()),
        DEFAULT_RESOURCE_ID
    );
    let volcengine_ws_url = get_value!(
        "VOLCENGINE_WS_URL",
        volcengine.and_then(|v| v.ws_url.clone()),
        DEFAULT_WS_URL
    );

    // Alibaba configuration
    let alibaba = yaml.alibaba.as_ref();
    let alibaba_app_key = get_secret!("ALIBABA_APP_KEY", alibaba.and_then(|a| a.app_key.clone()));
    let alibaba_access_key_id = get_secret!(
        "ALIBABA_ACCESS_KEY_ID",
        alibaba.and_then(|a| a.access_key_id.clone())
    );
    let alibaba_access_key_secret = get_secret!(
        "ALIBABA_ACCESS_KEY_SECRET",
        alibaba.and_then(|a| a.access_key_secret.clone())
    );
    let alibaba_region = get_value!(
        "ALIBABA_REGION",
        alibaba.and_then(|a| a.region.clone()),
        DEFAULT_REGION
    );
    let alibaba_ws_url = get_value!(
        "ALIBABA_WS_URL",
        alibaba.and_then(|a| a.ws_url.clone()),
        default_ws_url(&alibaba_region)
    );
    let alibaba_meta_endpoint = get_value!(
        "ALIBABA_META_ENDPOINT",
        alibaba.and_then(|a| a.meta_endpoint.clone()),
        default_meta_endpoint(&alibaba_region)
    );

    // CORS configuration: an empty list means permissive
    let cors_allowed_origins = yaml
        .cors
        .as_ref()
        .and_then(|c| c.allowed_origins.clone())
        .or_else(|| {
            env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|v| parse_list(&v))
        })
        .filter(|origins| !origins.is_empty());

    Ok(ServerConfig {
        host,
        port,
        asr_provider,
        volcengine_app_id,
        volcengine_access_token,
        volcengine_resource_id,
        volcengine_ws_url,
        alibaba_app_key,
        alibaba_access_key_id,
        alibaba_access_key_secret,
        alibaba_region,
        alibaba_ws_url,
        alibaba_meta_endpoint,
        cors_allowed_origins,
    })
}
