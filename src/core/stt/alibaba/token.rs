//! Access token acquisition for the NLS gateway.
//!
//! Tokens come from the POP RPC `CreateToken` action, signed with the
//! account's AccessKey pair (HMAC-SHA1, signature version 1.0). A token is
//! reused until it is within [`TOKEN_REFRESH_MARGIN_SECS`] of expiring.

use std::collections::BTreeMap;

use base64::prelude::*;
use hmac::{Hmac, Mac};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use sha1::Sha1;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::config::{AlibabaCredentials, TOKEN_API_VERSION};
use crate::core::stt::base::STTError;

/// Refresh a cached token this many seconds before it expires
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;
/// Assumed lifetime when the service omits an expiry
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3500;

type HmacSha1 = Hmac<Sha1>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub id: String,
    /// Expiry as unix seconds
    pub expire_time: i64,
}

impl CachedToken {
    pub fn is_valid_at(&self, now: i64) -> bool {
        self.expire_time - now > TOKEN_REFRESH_MARGIN_SECS
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TokenField {
    Object {
        #[serde(alias = "id")]
        #[serde(rename = "Id")]
        id: Option<String>,
        #[serde(alias = "expireTime")]
        #[serde(rename = "ExpireTime")]
        expire_time: Option<i64>,
    },
    Plain(String),
}

#[derive(Debug, Deserialize)]
struct CreateTokenResponse {
    #[serde(rename = "Token")]
    token: Option<TokenField>,
    #[serde(rename = "Message")]
    message: Option<String>,
}

/// RFC 3986 encoding as required by POP signatures
pub fn percent_encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
        .replace('*', "%2A")
        .replace("%7E", "~")
}

/// Sorted, percent-encoded `key=value` pairs joined with `&`
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Base64 HMAC-SHA1 signature over `METHOD&%2F&<encoded canonical query>`
pub fn pop_signature(method: &str, params: &BTreeMap<String, String>, secret: &str) -> String {
    let string_to_sign = format!(
        "{}&{}&{}",
        method,
        percent_encode("/"),
        percent_encode(&canonical_query(params))
    );

    // HMAC accepts keys of any length
    let mut mac = match HmacSha1::new_from_slice(format!("{secret}&").as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(string_to_sign.as_bytes());
    BASE64_STANDARD.encode(mac.finalize().into_bytes())
}

/// Fetches and caches NLS access tokens. Shared by all Alibaba sessions.
pub struct AlibabaTokenManager {
    http: reqwest::Client,
    credentials: AlibabaCredentials,
    endpoint: String,
    region: String,
    cache: Mutex<Option<CachedToken>>,
}

impl AlibabaTokenManager {
    pub fn new(
        credentials: AlibabaCredentials,
        region: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
            endpoint: endpoint.into(),
            region: region.into(),
            cache: Mutex::new(None),
        }
    }

    /// Return a token with more than the safety margin left, fetching one if needed.
    pub async fn get_token(&self) -> Result<String, STTError> {
        let mut cache = self.cache.lock().await;
        let now = chrono::Utc::now().timestamp();

        if let Some(token) = cache.as_ref()
            && token.is_valid_at(now)
        {
            debug!("Reusing cached Alibaba token (expires at {})", token.expire_time);
            return Ok(token.id.clone());
        }

        let token = self.fetch_token(now).await?;
        info!("Obtained Alibaba token valid until {}", token.expire_time);
        let id = token.id.clone();
        *cache = Some(token);
        Ok(id)
    }

    /// Currently cached token, if any
    pub async fn cached(&self) -> Option<CachedToken> {
        self.cache.lock().await.clone()
    }

    fn signed_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("AccessKeyId".to_string(), self.credentials.access_key_id.clone());
        params.insert("Action".to_string(), "CreateToken".to_string());
        params.insert("Format".to_string(), "JSON".to_string());
        params.insert("RegionId".to_string(), self.region.clone());
        params.insert("SignatureMethod".to_string(), "HMAC-SHA1".to_string());
        params.insert("SignatureNonce".to_string(), uuid::Uuid::new_v4().to_string());
        params.insert("SignatureVersion".to_string(), "1.0".to_string());
        params.insert(
            "Timestamp".to_string(),
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        );
        params.insert("Version".to_string(), TOKEN_API_VERSION.to_string());

        let signature = pop_signature("POST", &params, &self.credentials.access_key_secret);
        params.insert("Signature".to_string(), signature);
        params
    }

    async fn fetch_token(&self, now: i64) -> Result<CachedToken, STTError> {
        if !self.credentials.is_complete() {
            return Err(STTError::AuthError(
                "Alibaba AccessKey id and secret are required".to_string(),
            ));
        }

        let body = canonical_query(&self.signed_params());
        let url = format!("{}/", self.endpoint.trim_end_matches('/'));

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| STTError::AuthError(format!("Token request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| STTError::AuthError(format!("Failed to read token response: {e}")))?;

        let parsed: CreateTokenResponse = serde_json::from_str(&text).map_err(|e| {
            STTError::AuthError(format!("Invalid token response ({status}): {e}"))
        })?;

        let (id, expire_time) = match parsed.token {
            Some(TokenField::Object { id, expire_time }) => (id, expire_time),
            Some(TokenField::Plain(id)) => (Some(id), None),
            None => (None, None),
        };

        let Some(id) = id.filter(|id| !id.is_empty()) else {
            let reason = parsed.message.unwrap_or_else(|| format!("HTTP {status}"));
            error!("Alibaba token request returned no token: {}", reason);
            return Err(STTError::AuthError(format!(
                "Failed to obtain Alibaba access token: {reason}"
            )));
        };

        Ok(CachedToken {
            id,
            expire_time: expire_time.unwrap_or(now + DEFAULT_TOKEN_LIFETIME_SECS),
        })
    }
}
