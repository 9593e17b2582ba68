//! Chat completions over the OpenAI wire protocol.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chat::{ChatProvider, ChatRequest, ChatResponse, ResponseFormat, StopReason};
use crate::error::{LlmError, Result};
use crate::message::{Message, ToolCall};
use crate::tool::ToolDefinition;
use crate::usage::Usage;

use super::client::OpenAiClient;

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tools: &'a [ToolDefinition],
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    model: String,
    choices: Vec<WireChoice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}

fn wire_format(format: &ResponseFormat) -> Option<Value> {
    match format {
        ResponseFormat::Text => None,
        ResponseFormat::JsonObject => Some(serde_json::json!({"type": "json_object"})),
        ResponseFormat::JsonSchema(spec) => Some(serde_json::json!({
            "type": "json_schema",
            "json_schema": {
                "name": spec.name,
                "schema": spec.schema,
                "strict": spec.strict,
            },
        })),
    }
}

fn stop_reason(finish_reason: Option<&str>) -> StopReason {
    match finish_reason {
        Some("stop") | None => StopReason::Stop,
        Some("length") => StopReason::Length,
        Some("tool_calls") => StopReason::ToolCalls,
        Some("content_filter") => StopReason::ContentFilter,
        Some(_) => StopReason::Other,
    }
}

#[async_trait]
impl ChatProvider for OpenAiClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let model = request.model.as_deref().unwrap_or(self.model());
        let body = serde_json::to_value(WireRequest {
            model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: wire_format(&request.response_format),
            tools: &request.tools,
        })?;

        tracing::debug!(model, messages = request.messages.len(), "chat completion");
        let response: WireResponse = self.post_json("/chat/completions", &body).await?;

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            LlmError::response_format("at least one choice", "an empty choices array")
        })?;

        let message = match choice.message.tool_calls {
            Some(calls) if !calls.is_empty() => {
                Message::assistant_tool_calls(choice.message.content, calls)
            }
            _ => Message::assistant(choice.message.content.unwrap_or_default()),
        };

        Ok(ChatResponse {
            message,
            model: if response.model.is_empty() {
                model.to_owned()
            } else {
                response.model
            },
            stop_reason: stop_reason(choice.finish_reason.as_deref()),
            usage: response.usage,
        })
    }

    fn name(&self) -> &str {
        Self::PROVIDER
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::chat::JsonSchemaSpec;

    mod wire {
        use super::*;

        #[test]
        fn request_omits_unset_fields() {
            let body = serde_json::to_value(WireRequest {
                model: "gpt-4o-mini",
                messages: &[Message::user("hi")],
                temperature: None,
                max_tokens: None,
                response_format: None,
                tools: &[],
            })
            .unwrap();
            let obj = body.as_object().unwrap();
            assert!(!obj.contains_key("temperature"));
            assert!(!obj.contains_key("response_format"));
            assert!(!obj.contains_key("tools"));
        }

        #[test]
        fn json_schema_format_nests_spec() {
            let spec = JsonSchemaSpec::new(
                "attraction",
                serde_json::json!({"type": "object"}),
            )
            .strict();
            let format = wire_format(&ResponseFormat::JsonSchema(spec)).unwrap();
            assert_eq!(format["type"], "json_schema");
            assert_eq!(format["json_schema"]["name"], "attraction");
            assert_eq!(format["json_schema"]["strict"], true);
        }

        #[test]
        fn json_object_format() {
            let format = wire_format(&ResponseFormat::JsonObject).unwrap();
            assert_eq!(format["type"], "json_object");
        }

        #[test]
        fn text_format_is_omitted() {
            assert!(wire_format(&ResponseFormat::Text).is_none());
        }

        #[test]
        fn response_parses_tool_calls() {
            let response: WireResponse = serde_json::from_str(
                r#"{
                    "model": "gpt-4o-mini",
                    "choices": [{
                        "message": {
                            "content": null,
                            "tool_calls": [{
                                "id": "call_1",
                                "type": "function",
                                "function": {"name": "search", "arguments": "{}"}
                            }]
                        },
                        "finish_reason": "tool_calls"
                    }],
                    "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
                }"#,
            )
            .unwrap();
            let choice = &response.choices[0];
            assert_eq!(choice.finish_reason.as_deref(), Some("tool_calls"));
            assert_eq!(choice.message.tool_calls.as_ref().unwrap().len(), 1);
            assert_eq!(response.usage.unwrap().total_tokens, 15);
        }
    }

    mod finish_reason {
        use super::*;

        #[test]
        fn maps_known_reasons() {
            assert_eq!(stop_reason(Some("stop")), StopReason::Stop);
            assert_eq!(stop_reason(Some("length")), StopReason::Length);
            assert_eq!(stop_reason(Some("tool_calls")), StopReason::ToolCalls);
            assert_eq!(stop_reason(Some("content_filter")), StopReason::ContentFilter);
            assert_eq!(stop_reason(Some("weird")), StopReason::Other);
            assert_eq!(stop_reason(None), StopReason::Stop);
        }
    }
}
