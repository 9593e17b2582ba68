//! HTTP client shared by the chat and embedding endpoints.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{LlmError, Result};

use super::config::OpenAiConfig;

/// Client for OpenAI-compatible chat completion and embeddings APIs.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    pub(super) config: OpenAiConfig,
    pub(super) http: reqwest::Client,
}

impl OpenAiClient {
    /// Provider name used in logs and errors.
    pub const PROVIDER: &'static str = "openai";

    /// Create a client from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    /// Create a client configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns an auth error when `OPENAI_API_KEY` is unset, or an internal
    /// error if the HTTP client cannot be constructed.
    pub fn from_env() -> Result<Self> {
        Self::new(OpenAiConfig::from_env()?)
    }

    /// The configured default chat model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// POST a JSON body to an API path and decode the JSON reply.
    pub(super) async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T> {
        let url = format!("{}{path}", self.config.base_url);
        tracing::debug!(%url, "sending request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(LlmError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, &body).into());
        }

        let parsed = response.json::<T>().await.map_err(|e| {
            LlmError::response_format("a JSON API response", e.to_string())
        })?;
        Ok(parsed)
    }

    /// Map a non-success HTTP status and body to an [`LlmError`].
    ///
    /// The body is expected to be the standard `{"error": {...}}` envelope;
    /// anything else falls back to a plain status error.
    pub(super) fn status_error(status: StatusCode, body: &str) -> LlmError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Self::api_message(body).map_or_else(
                    || LlmError::auth(Self::PROVIDER, "Authentication failed"),
                    |(message, _)| LlmError::auth(Self::PROVIDER, message),
                )
            }
            StatusCode::TOO_MANY_REQUESTS => LlmError::rate_limited(Self::PROVIDER),
            _ => Self::api_message(body).map_or_else(
                || LlmError::http_status(status.as_u16(), body),
                |(message, code)| match code {
                    Some(code) => LlmError::provider_code(Self::PROVIDER, code, message),
                    None => LlmError::provider(Self::PROVIDER, message),
                },
            ),
        }
    }

    /// Pull the message and code out of an `{"error": {...}}` envelope.
    fn api_message(body: &str) -> Option<(String, Option<String>)> {
        let value: Value = serde_json::from_str(body).ok()?;
        let error = value.get("error")?;
        let message = error.get("message")?.as_str()?.to_owned();
        let code = error
            .get("code")
            .and_then(Value::as_str)
            .map(str::to_owned);
        Some((message, code))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::error::LlmErrorKind;

    #[test]
    fn new_builds_client() {
        let client = OpenAiClient::new(OpenAiConfig::new("sk-test")).unwrap();
        assert_eq!(client.model(), super::super::config::DEFAULT_MODEL);
    }

    mod status_error {
        use super::*;

        #[test]
        fn unauthorized_maps_to_auth() {
            let err = OpenAiClient::status_error(
                StatusCode::UNAUTHORIZED,
                r#"{"error": {"message": "Incorrect API key provided"}}"#,
            );
            assert_eq!(err.kind, LlmErrorKind::Auth);
            assert!(err.message.contains("Incorrect API key"));
        }

        #[test]
        fn too_many_requests_maps_to_rate_limited() {
            let err = OpenAiClient::status_error(StatusCode::TOO_MANY_REQUESTS, "");
            assert_eq!(err.kind, LlmErrorKind::RateLimited);
        }

        #[test]
        fn envelope_with_code_maps_to_provider_code() {
            let err = OpenAiClient::status_error(
                StatusCode::NOT_FOUND,
                r#"{"error": {"message": "The model does not exist", "code": "model_not_found"}}"#,
            );
            assert_eq!(err.kind, LlmErrorKind::Provider);
            assert_eq!(err.code.as_deref(), Some("model_not_found"));
        }

        #[test]
        fn unparseable_body_falls_back_to_http_status() {
            let err = OpenAiClient::status_error(StatusCode::BAD_GATEWAY, "<html>oops</html>");
            assert_eq!(err.kind, LlmErrorKind::HttpStatus);
            assert_eq!(err.code.as_deref(), Some("502"));
        }
    }
}
