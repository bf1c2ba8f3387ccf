//! DLC API client
//!
//! JSON-over-HTTPS client for the Tencent Cloud DLC endpoint. Requests are
//! signed with the TC3-HMAC-SHA256 scheme; responses arrive in a
//! `{"Response": {...}}` envelope carrying either the body or an error
//! object. Every call goes through a bounded retry loop that replays only
//! retryable failures.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{DlcError, Result};

const DLC_ENDPOINT: &str = "dlc.tencentcloudapi.com";
const API_VERSION: &str = "2021-01-25";
const SERVICE: &str = "dlc";
const DEFAULT_REGION: &str = "ap-guangzhou";

/// Page size for Describe* pagination loops
pub const PAGE_LIMIT: i64 = 100;

const MAX_ATTEMPTS: u32 = 4;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

type HmacSha256 = Hmac<Sha256>;

/// API credentials
#[derive(Debug, Clone)]
pub struct Credentials {
    pub secret_id: String,
    pub secret_key: String,
    pub token: Option<String>,
}

impl Credentials {
    /// Read credentials from the standard Tencent Cloud environment variables
    pub fn from_env() -> Result<Self> {
        let secret_id = std::env::var("TENCENTCLOUD_SECRET_ID")
            .map_err(|_| DlcError::MissingEnvVar("TENCENTCLOUD_SECRET_ID".to_string()))?;
        let secret_key = std::env::var("TENCENTCLOUD_SECRET_KEY")
            .map_err(|_| DlcError::MissingEnvVar("TENCENTCLOUD_SECRET_KEY".to_string()))?;
        let token = std::env::var("TENCENTCLOUD_SESSION_TOKEN").ok();

        Ok(Self {
            secret_id,
            secret_key,
            token,
        })
    }
}

/// DLC API client
pub struct DlcClient {
    http: reqwest::Client,
    credentials: Credentials,
    region: String,
}

impl DlcClient {
    /// Create a new client for the given region
    pub fn new(credentials: Credentials, region: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
            region: region.into(),
        }
    }

    /// Create a client from environment variables
    ///
    /// Region comes from `TENCENTCLOUD_REGION`, defaulting to ap-guangzhou.
    pub fn from_env() -> Result<Self> {
        let credentials = Credentials::from_env()?;
        let region =
            std::env::var("TENCENTCLOUD_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string());
        Ok(Self::new(credentials, region))
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Invoke an API action, retrying retryable failures with linear backoff
    pub async fn call<Req, Resp>(&self, action: &str, request: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let payload = serde_json::to_string(request)?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.call_once(action, &payload).await {
                Ok(body) => return Ok(serde_json::from_value(body)?),
                Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                    warn!(action, attempt, error = %e, "retrying DLC call");
                    tokio::time::sleep(RETRY_BASE_DELAY * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Single signed request/response exchange
    async fn call_once(&self, action: &str, payload: &str) -> Result<serde_json::Value> {
        let timestamp = Utc::now().timestamp();
        let authorization = build_authorization(
            &self.credentials.secret_id,
            &self.credentials.secret_key,
            action,
            payload,
            timestamp,
        )?;

        debug!(action, region = %self.region, "calling DLC API");

        let mut request = self
            .http
            .post(format!("https://{}", DLC_ENDPOINT))
            .header("Content-Type", "application/json; charset=utf-8")
            .header("Host", DLC_ENDPOINT)
            .header("Authorization", authorization)
            .header("X-TC-Action", action)
            .header("X-TC-Version", API_VERSION)
            .header("X-TC-Region", &self.region)
            .header("X-TC-Timestamp", timestamp.to_string())
            .body(payload.to_string());

        if let Some(token) = &self.credentials.token {
            request = request.header("X-TC-Token", token);
        }

        let envelope: serde_json::Value = request.send().await?.json().await?;

        let response = envelope
            .get("Response")
            .cloned()
            .ok_or_else(|| DlcError::MalformedResponse("missing Response object".to_string()))?;

        if let Some(error) = response.get("Error") {
            let code = error
                .get("Code")
                .and_then(|v| v.as_str())
                .unwrap_or("UnknownError")
                .to_string();
            let message = error
                .get("Message")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let request_id = response
                .get("RequestId")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            return Err(DlcError::Api {
                code,
                message,
                request_id,
            });
        }

        Ok(response)
    }
}

/// Build the TC3-HMAC-SHA256 canonical request for a POST to "/"
fn canonical_request(action: &str, payload: &str) -> String {
    let hashed_payload = sha256_hex(payload.as_bytes());
    format!(
        "POST\n/\n\ncontent-type:application/json; charset=utf-8\nhost:{}\nx-tc-action:{}\n\ncontent-type;host;x-tc-action\n{}",
        DLC_ENDPOINT,
        action.to_lowercase(),
        hashed_payload
    )
}

/// Build the Authorization header for one request
fn build_authorization(
    secret_id: &str,
    secret_key: &str,
    action: &str,
    payload: &str,
    timestamp: i64,
) -> Result<String> {
    let date = Utc
        .timestamp_opt(timestamp, 0)
        .single()
        .unwrap_or_else(Utc::now)
        .format("%Y-%m-%d")
        .to_string();
    let credential_scope = format!("{}/{}/tc3_request", date, SERVICE);

    let canonical = canonical_request(action, payload);
    let string_to_sign = format!(
        "TC3-HMAC-SHA256\n{}\n{}\n{}",
        timestamp,
        credential_scope,
        sha256_hex(canonical.as_bytes())
    );

    let secret_date = hmac_sha256(format!("TC3{}", secret_key).as_bytes(), date.as_bytes())?;
    let secret_service = hmac_sha256(&secret_date, SERVICE.as_bytes())?;
    let secret_signing = hmac_sha256(&secret_service, b"tc3_request")?;
    let signature = hex::encode(hmac_sha256(&secret_signing, string_to_sign.as_bytes())?);

    Ok(format!(
        "TC3-HMAC-SHA256 Credential={}/{}, SignedHeaders=content-type;host;x-tc-action, Signature={}",
        secret_id, credential_scope, signature
    ))
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| DlcError::Signing(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_request_shape() {
        let canonical = canonical_request("DescribeDataEngines", "{}");
        let lines: Vec<&str> = canonical.split('\n').collect();

        assert_eq!(lines[0], "POST");
        assert_eq!(lines[1], "/");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "content-type:application/json; charset=utf-8");
        assert_eq!(lines[4], "host:dlc.tencentcloudapi.com");
        assert_eq!(lines[5], "x-tc-action:describedataengines");
        assert_eq!(lines[6], "");
        assert_eq!(lines[7], "content-type;host;x-tc-action");
        // trailing line is the hex-encoded payload hash
        assert_eq!(lines[8].len(), 64);
        assert!(lines[8].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn authorization_header_format() {
        let auth = build_authorization(
            "AKIDexample",
            "secret",
            "CreateDataEngine",
            "{}",
            1_700_000_000,
        )
        .unwrap();

        assert!(auth.starts_with("TC3-HMAC-SHA256 Credential=AKIDexample/"));
        assert!(auth.contains("/dlc/tc3_request"));
        assert!(auth.contains("SignedHeaders=content-type;host;x-tc-action"));

        let signature = auth.rsplit("Signature=").next().unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn authorization_is_deterministic() {
        let a = build_authorization("id", "key", "DescribeUsers", "{}", 1_700_000_000).unwrap();
        let b = build_authorization("id", "key", "DescribeUsers", "{}", 1_700_000_000).unwrap();
        assert_eq!(a, b);

        // Different timestamp changes the signature
        let c = build_authorization("id", "key", "DescribeUsers", "{}", 1_700_000_001).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn scope_uses_utc_date_of_timestamp() {
        // 2023-11-14T22:13:20Z
        let auth =
            build_authorization("id", "key", "DescribeUsers", "{}", 1_700_000_000).unwrap();
        assert!(auth.contains("Credential=id/2023-11-14/dlc/tc3_request"));
    }
}
