//! Calendar service client.
//!
//! The calendar adapters do not talk to Google directly: they ask a
//! function-execution service to run `GOOGLE_CALENDAR__*` functions on behalf
//! of a linked account. [`CalendarBackend`] is the seam; [`AciCalendarClient`]
//! is the HTTP implementation.

use async_trait::async_trait;
use chrono::TimeZone;
use chrono_tz::Tz;
use lifechat_core::error::ToolError;
use lifechat_core::record::parse_local_timestamp;
use lifechat_core::tool::ToolResult;
use std::time::Duration;
use tracing::{debug, warn};

pub const EVENTS_INSERT: &str = "GOOGLE_CALENDAR__EVENTS_INSERT";
pub const EVENTS_LIST: &str = "GOOGLE_CALENDAR__EVENTS_LIST";

/// Executes one calendar function for one account.
///
/// Network and authorization failures come back as a failed [`ToolResult`],
/// not as `Err`.
#[async_trait]
pub trait CalendarBackend: Send + Sync {
    async fn execute(
        &self,
        function: &str,
        input: serde_json::Value,
        account_id: &str,
    ) -> Result<ToolResult, ToolError>;
}

/// HTTP client for the function-execution API.
pub struct AciCalendarClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AciCalendarClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    pub fn from_config(config: &lifechat_config::CalendarConfig) -> Self {
        Self::new(&config.base_url, config.api_key.clone().unwrap_or_default())
    }

    fn function_url(&self, function: &str) -> String {
        format!("{}/functions/{function}/execute", self.base_url)
    }
}

#[async_trait]
impl CalendarBackend for AciCalendarClient {
    async fn execute(
        &self,
        function: &str,
        input: serde_json::Value,
        account_id: &str,
    ) -> Result<ToolResult, ToolError> {
        if self.api_key.is_empty() {
            return Ok(ToolResult::failed("calendar service API key is not configured"));
        }

        let body = serde_json::json!({
            "function_input": input,
            "linked_account_owner_id": account_id,
        });

        debug!(function, account = %account_id, "Calling calendar service");

        let response = match self
            .client
            .post(self.function_url(function))
            .header("X-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(function, error = %e, "Calendar service unreachable");
                return Ok(ToolResult::failed(format!("network error: {e}")));
            }
        };

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Ok(ToolResult::failed(format!("authorization failed (HTTP {status})")));
        }
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(function, status, body = %text, "Calendar service returned error");
            return Ok(ToolResult::failed(format!("HTTP {status}: {text}")));
        }

        match response.json::<ToolResult>().await {
            Ok(result) => Ok(result),
            Err(e) => Ok(ToolResult::failed(format!("unreadable calendar response: {e}"))),
        }
    }
}

/// Turn a model-supplied timestamp into RFC 3339.
///
/// Values that already carry an offset pass through; naive values are read
/// as wall-clock time in `tz`.
pub fn to_rfc3339(raw: &str, tz: Tz) -> Result<String, ToolError> {
    let raw = raw.trim();
    if chrono::DateTime::parse_from_rfc3339(raw).is_ok() {
        return Ok(raw.to_string());
    }
    let naive = parse_local_timestamp(raw)
        .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.to_rfc3339())
        .ok_or_else(|| ToolError::InvalidArguments(format!("'{raw}' does not exist in {tz}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    #[tokio::test]
    async fn posts_function_input_with_api_key() {
        let app = Router::new().route(
            "/v1/functions/{function}/execute",
            post(
                |axum::extract::Path(function): axum::extract::Path<String>,
                 headers: HeaderMap,
                 Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(function, EVENTS_INSERT);
                    assert_eq!(headers["x-api-key"], "aci-key");
                    assert_eq!(body["linked_account_owner_id"], "owner-1");
                    Json(serde_json::json!({
                        "success": true,
                        "data": {"id": "evt_1", "summary": body["function_input"]["body"]["summary"]}
                    }))
                },
            ),
        );
        let client = AciCalendarClient::new(spawn(app).await, "aci-key");

        let result = client
            .execute(
                EVENTS_INSERT,
                serde_json::json!({"body": {"summary": "Dinner"}}),
                "owner-1",
            )
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.data.unwrap()["summary"], "Dinner");
    }

    #[tokio::test]
    async fn unauthorized_becomes_failed_result() {
        let app = Router::new().route(
            "/v1/functions/{function}/execute",
            post(|| async { StatusCode::UNAUTHORIZED }),
        );
        let client = AciCalendarClient::new(spawn(app).await, "stale");

        let result = client
            .execute(EVENTS_LIST, serde_json::json!({}), "owner")
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("401"));
    }

    #[tokio::test]
    async fn service_error_payload_passes_through() {
        let app = Router::new().route(
            "/v1/functions/{function}/execute",
            post(|| async { Json(serde_json::json!({"success": false, "error": "auth_expired"})) }),
        );
        let client = AciCalendarClient::new(spawn(app).await, "k");

        let result = client
            .execute(EVENTS_LIST, serde_json::json!({}), "owner")
            .await
            .unwrap();
        assert_eq!(result, ToolResult::failed("auth_expired"));
    }

    #[tokio::test]
    async fn unreachable_service_is_not_an_error() {
        // Port 9 (discard) is closed on test machines
        let client = AciCalendarClient::new("http://127.0.0.1:9/v1", "k");
        let result = client
            .execute(EVENTS_LIST, serde_json::json!({}), "owner")
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("network error"));
    }

    #[tokio::test]
    async fn missing_api_key_short_circuits() {
        let client = AciCalendarClient::new("http://127.0.0.1:9/v1", "");
        let result = client
            .execute(EVENTS_LIST, serde_json::json!({}), "owner")
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("not configured"));
    }

    #[test]
    fn rfc3339_keeps_offsets_and_localizes_naive_times() {
        let tz = chrono_tz::Europe::Berlin;
        assert_eq!(
            to_rfc3339("2025-06-15T08:00:00+02:00", tz).unwrap(),
            "2025-06-15T08:00:00+02:00"
        );
        assert_eq!(
            to_rfc3339("2025-06-15T08:00:00", tz).unwrap(),
            "2025-06-15T08:00:00+02:00"
        );
        assert_eq!(
            to_rfc3339("2025-01-15", tz).unwrap(),
            "2025-01-15T00:00:00+01:00"
        );
        assert!(to_rfc3339("next week", tz).is_err());
    }
}
