//! HTTP client for the structured-output reasoning service.

use std::time::Duration;

use async_trait::async_trait;
use loreforge_core::error::DomainError;
use loreforge_core::reasoning::{ReasoningRequest, ReasoningService};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

/// Posts each request as JSON and returns the JSON the service answers with.
///
/// Services that wrap their answer as `{"output": ...}` are unwrapped, and an
/// answer delivered as a JSON-encoded string is decoded.
#[derive(Debug, Clone)]
pub struct HttpReasoningService {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl HttpReasoningService {
    /// Creates a client for `url`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Infrastructure(format!("reasoning client build failed: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
            api_key,
        })
    }
}

/// Unwraps the structured output from a response body.
#[must_use]
pub fn decode_output(body: serde_json::Value) -> serde_json::Value {
    let output = match body {
        serde_json::Value::Object(mut map) if map.len() == 1 && map.contains_key("output") => {
            map.remove("output").unwrap_or_default()
        }
        other => other,
    };
    match output {
        serde_json::Value::String(text) => {
            serde_json::from_str(text.trim()).unwrap_or(serde_json::Value::String(text))
        }
        other => other,
    }
}

#[async_trait]
impl ReasoningService for HttpReasoningService {
    #[instrument(skip_all, fields(role = request.role.as_str()))]
    async fn reason(&self, request: &ReasoningRequest) -> Result<serde_json::Value, DomainError> {
        let mut call = self.client.post(&self.url).json(request);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        let response = call
            .send()
            .await
            .map_err(|e| DomainError::Reasoning(format!("http request failed: {e}")))?;

        let status = response.status();
        if status != StatusCode::OK {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(DomainError::Reasoning(format!(
                "http status {}: {message}",
                status.as_u16()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DomainError::Reasoning(format!("decode response failed: {e}")))?;
        debug!("reasoning response received");
        Ok(decode_output(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_object_passes_through() {
        let body = json!({"status": "Valid"});
        assert_eq!(decode_output(body.clone()), body);
    }

    #[test]
    fn test_output_wrapper_is_removed() {
        assert_eq!(
            decode_output(json!({"output": {"pacing": "tense"}})),
            json!({"pacing": "tense"})
        );
    }

    #[test]
    fn test_json_text_is_decoded() {
        assert_eq!(
            decode_output(json!({"output": " {\"summary\": \"done\"} "})),
            json!({"summary": "done"})
        );
    }

    #[test]
    fn test_prose_text_stays_a_string() {
        assert_eq!(decode_output(json!("just words")), json!("just words"));
    }

    #[test]
    fn test_client_builds() {
        let service =
            HttpReasoningService::new("http://localhost:9/reason", None, Duration::from_secs(1));
        assert!(service.is_ok());
    }
}
