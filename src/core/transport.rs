use crate::domain::model::{Operation, ResponseFormat, SignedRequest};
use crate::domain::ports::Transport;
use crate::utils::error::{ExpressError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Endpoint per operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub tracking: String,
    pub pricing: String,
}

impl Endpoints {
    pub fn for_operation(&self, operation: Operation) -> &str {
        match operation {
            Operation::Tracking => &self.tracking,
            Operation::Pricing => &self.pricing,
        }
    }
}

/// 以表單 POST 呼叫上游 API，並把失敗歸類成 ErrorKind
pub struct HttpTransport {
    client: Client,
    endpoints: Endpoints,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExpressError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoints,
            timeout,
        })
    }

    fn classify(&self, err: reqwest::Error) -> ExpressError {
        match ExpressError::from(err) {
            ExpressError::Timeout { .. } => ExpressError::Timeout {
                timeout_ms: duration_ms(self.timeout),
            },
            other => other,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &SignedRequest) -> Result<serde_json::Value> {
        let endpoint = self.endpoints.for_operation(request.operation);
        tracing::debug!("Sending {} request upstream", request.operation);

        let response = self
            .client
            .post(endpoint)
            .form(&request.form_fields())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        tracing::debug!("Upstream {} response status: {}", request.operation, status);

        if !status.is_success() {
            return Err(ExpressError::UpstreamRejected {
                code: status.as_u16().to_string(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        if request.params.get("show") == Some(ResponseFormat::Raw.wire_value()) {
            return decode_raw(&body);
        }

        let json_data: serde_json::Value = serde_json::from_slice(&body)?;

        check_upstream_status(&json_data)?;
        Ok(json_data)
    }
}

/// 純文字回應包成 JSON 字串；上游錯誤仍以 JSON 物件回傳
fn decode_raw(body: &[u8]) -> Result<serde_json::Value> {
    if let Ok(json_data @ serde_json::Value::Object(_)) = serde_json::from_slice(body) {
        check_upstream_status(&json_data)?;
        return Ok(json_data);
    }

    let text = std::str::from_utf8(body)
        .map_err(|e| ExpressError::decode(format!("raw response is not UTF-8: {}", e)))?;
    Ok(serde_json::Value::String(text.to_string()))
}

/// Whole milliseconds, saturating at `u64::MAX`.
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// 上游以 HTTP 200 回傳錯誤時，body 會帶 `result: false` 或非 200 的 `returnCode`
pub fn check_upstream_status(body: &serde_json::Value) -> Result<()> {
    let rejected_flag = body.get("result").and_then(|v| v.as_bool()) == Some(false);
    let return_code = body.get("returnCode").map(|v| match v {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    });
    let bad_code = return_code.as_deref().is_some_and(|code| code != "200");

    if rejected_flag || bad_code {
        let message = body
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("request rejected")
            .to_string();
        return Err(ExpressError::UpstreamRejected {
            code: return_code.unwrap_or_else(|| "unknown".to_string()),
            message,
        });
    }
    Ok(())
}
