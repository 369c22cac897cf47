use std::env;

use super::ServerConfig;
use super::utils::parse_list;
use super::validation::{validate_port, validate_provider};
use crate::core::stt::alibaba::{DEFAULT_REGION, default_meta_endpoint, default_ws_url};
use crate::core::stt::volcengine::{DEFAULT_RESOURCE_ID, DEFAULT_WS_URL};

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Reads configuration from environment variables, with sensible defaults.
    /// Also loads from .env file if present using dotenvy.
    ///
    /// # Errors
    /// Returns an error if:
    /// - `PORT` is not a valid port number
    /// - `ASR_PROVIDER` names an unsupported provider
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        // Server configuration
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid port number: {e}"))?;

        let asr_provider = env::var("ASR_PROVIDER").unwrap_or_else(|_| "volcengine".to_string());

        // Volcengine configuration
        let volcengine_app_id = env::var("VOLCENGINE_APP_ID").unwrap_or_default();
        let volcengine_access_token = env::var("VOLCENGINE_TOKEN").unwrap_or_default();
        let volcengine_resource_id =
            env::var("VOLCENGINE_RESOURCE_ID").unwrap_or_else(|_| DEFAULT_RESOURCE_ID.to_string());
        let volcengine_ws_url =
            env::var("VOLCENGINE_WS_URL").unwrap_or_else(|_| DEFAULT_WS_URL.to_string());

        // Alibaba configuration; endpoints follow the region unless overridden
        let alibaba_app_key = env::var("ALIBABA_APP_KEY").unwrap_or_default();
        let alibaba_access_key_id = env::var("ALIBABA_ACCESS_KEY_ID").unwrap_or_default();
        let alibaba_access_key_secret = env::var("ALIBABA_ACCESS_KEY_SECRET").unwrap_or_default();
        let alibaba_region =
            env::var("ALIBABA_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string());
        let alibaba_ws_url =
            env::var("ALIBABA_WS_URL").unwrap_or_else(|_| default_ws_url(&alibaba_region));
        let alibaba_meta_endpoint = env::var("ALIBABA_META_ENDPOINT")
            .unwrap_or_else(|_| default_meta_endpoint(&alibaba_region));

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .ok()
            .map(|v| parse_list(&v))
            .filter(|origins| !origins.is_empty());

        validate_provider(&asr_provider)?;
        validate_port(port)?;

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
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 14] = [
        "HOST",
        "PORT",
        "ASR_PROVIDER",
        "VOLCENGINE_APP_ID",
        "VOLCENGINE_TOKEN",
        "VOLCENGINE_RESOURCE_ID",
        "VOLCENGINE_WS_URL",
        "ALIBABA_APP_KEY",
        "ALIBABA_ACCESS_KEY_ID",
        "ALIBABA_ACCESS_KEY_SECRET",
        "ALIBABA_REGION",
        "ALIBABA_WS_URL",
        "ALIBABA_META_ENDPOINT",
        "CORS_ALLOWED_ORIGINS",
    ];

    // Helper to clean up environment variables after tests
    fn cleanup_env_vars() {
        for var in VARS {
            unsafe {
                env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        cleanup_env_vars();

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.port, 3001);
        assert_eq!(config.asr_provider, "volcengine");
        assert_eq!(config.volcengine_resource_id, DEFAULT_RESOURCE_ID);
        assert_eq!(config.alibaba_region, "cn-shanghai");
        assert!(config.cors_allowed_origins.is_none());
    }

    #[test]
    #[serial]
    fn test_from_env_reads_provider_settings() {
        cleanup_env_vars();
        unsafe {
            env::set_var("PORT", "4000");
            env::set_var("ASR_PROVIDER", "Alibaba");
            env::set_var("VOLCENGINE_APP_ID", "volc-app");
            env::set_var("VOLCENGINE_TOKEN", "volc-token");
            env::set_var("ALIBABA_APP_KEY", "ali-app");
            env::set_var("ALIBABA_ACCESS_KEY_ID", "ali-id");
            env::set_var("ALIBABA_ACCESS_KEY_SECRET", "ali-secret");
            env::set_var("ALIBABA_REGION", "cn-shenzhen");
            env::set_var("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.asr_provider, "Alibaba");
        assert!(config.has_volcengine_credentials());
        assert!(config.has_alibaba_credentials());
        assert_eq!(
            config.alibaba_ws_url,
            "wss://nls-gateway.cn-shenzhen.aliyuncs.com/ws/v1"
        );
        assert_eq!(
            config.cors_allowed_origins,
            Some(vec!["http://a.test".to_string(), "http://b.test".to_string()])
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_explicit_endpoints_override_region() {
        cleanup_env_vars();
        unsafe {
            env::set_var("ALIBABA_REGION", "cn-beijing");
            env::set_var("ALIBABA_WS_URL", "ws://127.0.0.1:9000/ws/v1");
            env::set_var("ALIBABA_META_ENDPOINT", "http://127.0.0.1:9001");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.alibaba_ws_url, "ws://127.0.0.1:9000/ws/v1");
        assert_eq!(config.alibaba_meta_endpoint, "http://127.0.0.1:9001");

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_port() {
        cleanup_env_vars();
        unsafe {
            env::set_var("PORT", "not-a-port");
        }

        let err = ServerConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("Invalid port number"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_unknown_provider() {
        cleanup_env_vars();
        unsafe {
            env::set_var("ASR_PROVIDER", "deepgram");
        }

        assert!(ServerConfig::from_env().is_err());

        cleanup_env_vars();
    }
}
