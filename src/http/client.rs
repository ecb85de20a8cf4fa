//! Low-level HTTP transport — `HttpTransport`.
//!
//! Two endpoints: `/info` (reads) and `/exchange` (signed envelopes). Every
//! request passes through the optional [`Throttle`] with its weight first.
//! Failures are classified and returned; nothing is retried, since a
//! resubmitted exchange request would reuse its nonce.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{HttpError, SdkError};
use crate::rate_limit::{info_weight, Throttle};
use crate::signing::SignedEnvelope;

/// REST transport for one venue deployment.
#[derive(Clone)]
pub struct HttpTransport {
    base_url: String,
    client: Client,
    throttle: Option<Arc<dyn Throttle>>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("throttled", &self.throttle.is_some())
            .finish()
    }
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, SdkError> {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(HttpError::InvalidUrl(base_url.to_string()).into());
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(HttpError::from)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            throttle: None,
        })
    }

    /// Gate every request through `throttle`.
    pub fn with_throttle(mut self, throttle: Arc<dyn Throttle>) -> Self {
        self.throttle = Some(throttle);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `/info`. Weight is derived from the request's `type`.
    pub async fn post_info<T: DeserializeOwned>(&self, request: &Value) -> Result<T, SdkError> {
        let weight = request
            .get("type")
            .and_then(Value::as_str)
            .map(info_weight)
            .unwrap_or(20);
        self.post("/info", request, weight).await
    }

    /// POST `/exchange` with a signed envelope.
    pub async fn post_exchange(
        &self,
        envelope: &SignedEnvelope,
        weight: u32,
    ) -> Result<Value, SdkError> {
        let kind = action_kind(&envelope.action);
        tracing::debug!(nonce = envelope.nonce, weight, "Posting {} action", kind);
        self.post("/exchange", envelope, weight).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        weight: u32,
    ) -> Result<T, SdkError> {
        if let Some(throttle) = &self.throttle {
            throttle.throttle(weight).await?;
        }

        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(HttpError::from)?;
        let status = resp.status().as_u16();

        if !resp.status().is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "Request to {} failed: {}", url, body_text);
            return Err(HttpError::Api {
                status,
                message: body_text,
            }
            .into());
        }

        let value: Value = resp.json().await.map_err(HttpError::from)?;
        let value = check_venue_status(status, value)?;
        Ok(serde_json::from_value(value)?)
    }
}

/// The `type` tag of a wire action, for logging.
pub(crate) fn action_kind(action: &Value) -> &str {
    action.get("type").and_then(Value::as_str).unwrap_or("unknown")
}

/// Map a 2xx body of the form `{"status": "err", "response": msg}` to
/// [`HttpError::Api`].
pub(crate) fn check_venue_status(status: u16, body: Value) -> Result<Value, HttpError> {
    if body.get("status").and_then(Value::as_str) == Some("err") {
        let message = match body.get("response") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "unknown error".to_string(),
        };
        return Err(HttpError::Api { status, message });
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_venue_error_maps_to_api() {
        let err = check_venue_status(200, json!({"status": "err", "response": "Insufficient margin"}))
            .unwrap_err();
        match err {
            HttpError::Api { status, message } => {
                assert_eq!(status, 200);
                assert_eq!(message, "Insufficient margin");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_ok_body_passes_through() {
        let body = json!({"status": "ok", "response": {"type": "cancel"}});
        assert_eq!(check_venue_status(200, body.clone()).unwrap(), body);

        let info = json!([{"coin": "BTC"}]);
        assert_eq!(check_venue_status(200, info.clone()).unwrap(), info);
    }

    #[test]
    fn test_action_kind() {
        assert_eq!(action_kind(&json!({"type": "order", "orders": []})), "order");
        assert_eq!(action_kind(&json!({"orders": []})), "unknown");
        assert_eq!(action_kind(&json!({"type": 7})), "unknown");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpTransport::new("api.hyperliquid.xyz").unwrap_err();
        assert!(matches!(err, SdkError::Http(HttpError::InvalidUrl(_))));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let transport = HttpTransport::new("https://api.hyperliquid.xyz/").unwrap();
        assert_eq!(transport.base_url(), "https://api.hyperliquid.xyz");
    }
}
