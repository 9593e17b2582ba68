//! Chat completion requests, responses, and the provider trait.
//!
//! [`ChatRequest`] is a provider-agnostic description of a single completion
//! call. [`ChatProvider`] is the seam every backend implements; the OpenAI
//! client and the scripted mock in [`crate::llms`] both live behind it.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::{LlmError, Result};
use crate::message::{Message, ToolCall};
use crate::tool::ToolDefinition;
use crate::usage::Usage;

/// A JSON Schema attached to a request for schema-guided output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSchemaSpec {
    /// Name identifying the schema to the provider.
    pub name: String,
    /// The schema itself.
    pub schema: Value,
    /// Whether the provider should enforce the schema strictly.
    #[serde(default)]
    pub strict: bool,
}

impl JsonSchemaSpec {
    /// Create a schema spec from a name and schema value.
    #[must_use]
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
            strict: false,
        }
    }

    /// Derive a schema spec from a Rust type.
    ///
    /// The `$schema` meta field is stripped since completion providers
    /// reject it inside `response_format`.
    #[must_use]
    pub fn from_type<T: JsonSchema>() -> Self {
        let mut schema = serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default();
        if let Some(obj) = schema.as_object_mut() {
            obj.remove("$schema");
        }
        let name = schema
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("output")
            .to_owned();
        Self::new(name, schema)
    }

    /// Mark the schema as strictly enforced.
    #[must_use]
    pub const fn strict(mut self) -> Self {
        self.strict = true;
        self
    }
}

/// Requested shape of the model's reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ResponseFormat {
    /// Plain text, no constraint.
    #[default]
    Text,
    /// Any syntactically valid JSON object.
    JsonObject,
    /// JSON conforming to the given schema.
    JsonSchema(JsonSchemaSpec),
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum StopReason {
    /// Natural end of the reply.
    Stop,
    /// Hit the output token limit.
    Length,
    /// The model requested tool calls.
    ToolCalls,
    /// Content was filtered by the provider.
    ContentFilter,
    /// Anything the provider reports that we do not model.
    Other,
}

/// A chat completion request.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// Conversation so far, oldest first.
    pub messages: Vec<Message>,
    /// Model override; the provider's configured default applies when unset.
    pub model: Option<String>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Requested reply shape.
    pub response_format: ResponseFormat,
    /// Tools the model may call.
    pub tools: Vec<ToolDefinition>,
}

impl ChatRequest {
    /// Create a request from a list of messages.
    #[must_use]
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    /// Create a request with a single user message.
    #[must_use]
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self::new(vec![Message::user(prompt)])
    }

    /// Append a message to the conversation.
    #[must_use]
    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Set the model override.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the output token limit.
    #[must_use]
    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the requested reply shape.
    #[must_use]
    pub fn response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }

    /// Set the tools the model may call.
    #[must_use]
    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }
}

/// A chat completion response.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// The assistant message produced by the model.
    pub message: Message,
    /// The model that served the request, as reported by the provider.
    pub model: String,
    /// Why generation stopped.
    pub stop_reason: StopReason,
    /// Token accounting, when the provider reports it.
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// Get the reply text, or an empty string for tool-call-only replies.
    #[must_use]
    pub fn text(&self) -> &str {
        self.message.text().unwrap_or_default()
    }

    /// Get the tool calls, if the model requested any.
    #[must_use]
    pub fn tool_calls(&self) -> Option<&[ToolCall]> {
        self.message.tool_calls.as_deref()
    }

    /// Deserialize the reply text into a typed value.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] with [`crate::error::LlmErrorKind::ResponseFormat`]
    /// when the text is not valid JSON for `T`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(self.text()).map_err(|e| {
            LlmError::response_format("JSON matching the requested type", e.to_string()).into()
        })
    }
}

/// A backend capable of serving chat completion requests.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Execute a single completion request.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Llm`] when the provider rejects the request
    /// or the transport fails.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Name identifying the provider in logs and errors.
    fn name(&self) -> &str;
}

#[async_trait]
impl ChatProvider for Arc<dyn ChatProvider> {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        (**self).chat(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Convenience helpers layered over [`ChatProvider`].
#[async_trait]
pub trait ChatProviderExt: ChatProvider {
    /// Send a single user prompt and return the reply text.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`ChatProvider::chat`].
    async fn prompt(&self, prompt: &str) -> Result<String> {
        let response = self.chat(ChatRequest::from_prompt(prompt)).await?;
        Ok(response.text().to_owned())
    }
}

#[async_trait]
impl<P: ChatProvider + ?Sized> ChatProviderExt for P {}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    mod request {
        use super::*;

        #[test]
        fn builder_chains() {
            let request = ChatRequest::from_prompt("hello")
                .model("gpt-4o-mini")
                .temperature(0.2)
                .max_tokens(256)
                .response_format(ResponseFormat::JsonObject);
            assert_eq!(request.messages.len(), 1);
            assert_eq!(request.model.as_deref(), Some("gpt-4o-mini"));
            assert_eq!(request.temperature, Some(0.2));
            assert_eq!(request.max_tokens, Some(256));
            assert!(matches!(request.response_format, ResponseFormat::JsonObject));
        }

        #[test]
        fn message_appends() {
            let request = ChatRequest::new(vec![Message::system("be terse")])
                .message(Message::user("hi"));
            assert_eq!(request.messages.len(), 2);
        }

        #[test]
        fn default_format_is_text() {
            assert!(matches!(
                ChatRequest::default().response_format,
                ResponseFormat::Text
            ));
        }
    }

    mod schema_spec {
        use super::*;

        #[derive(JsonSchema)]
        #[allow(dead_code)]
        struct Attraction {
            name: String,
            city: String,
        }

        #[test]
        fn from_type_strips_meta_and_names_from_title() {
            let spec = JsonSchemaSpec::from_type::<Attraction>();
            assert_eq!(spec.name, "Attraction");
            assert!(spec.schema.get("$schema").is_none());
            assert!(spec.schema.get("properties").is_some());
        }

        #[test]
        fn strict_sets_flag() {
            let spec = JsonSchemaSpec::new("x", serde_json::json!({})).strict();
            assert!(spec.strict);
        }
    }

    mod provider {
        use super::*;
        use crate::llms::MockChat;

        #[tokio::test]
        async fn shared_provider_delegates() {
            let provider: Arc<dyn ChatProvider> = Arc::new(MockChat::reply("shared"));
            let response = provider.chat(ChatRequest::from_prompt("hi")).await.unwrap();
            assert_eq!(response.text(), "shared");
            assert_eq!(provider.name(), "mock");
        }

        #[tokio::test]
        async fn prompt_helper_returns_text() {
            let provider = MockChat::reply("short answer");
            assert_eq!(provider.prompt("q").await.unwrap(), "short answer");
        }
    }

    mod response {
        use super::*;

        fn response_with(text: &str) -> ChatResponse {
            ChatResponse {
                message: Message::assistant(text),
                model: "test-model".to_owned(),
                stop_reason: StopReason::Stop,
                usage: None,
            }
        }

        #[test]
        fn parse_deserializes_typed_value() {
            #[derive(Deserialize)]
            struct Out {
                n: u32,
            }
            let out: Out = response_with(r#"{"n": 4}"#).parse().unwrap();
            assert_eq!(out.n, 4);
        }

        #[test]
        fn parse_rejects_non_json() {
            let result = response_with("not json").parse::<Value>();
            assert!(result.is_err());
        }

        #[test]
        fn text_empty_for_tool_call_reply() {
            let response = ChatResponse {
                message: Message::assistant_tool_calls(
                    None,
                    vec![ToolCall::function("id", "f", "{}")],
                ),
                model: "test-model".to_owned(),
                stop_reason: StopReason::ToolCalls,
                usage: None,
            };
            assert_eq!(response.text(), "");
            assert_eq!(response.tool_calls().unwrap().len(), 1);
        }
    }
}
