//! Schema-guided structured extraction.
//!
//! [`Extractor`] composes a prompt from free-form text and a caller-supplied
//! JSON Schema, issues one chat completion, and recovers the JSON value from
//! the reply. The schema travels as prompt content; only its JSON syntax is
//! checked here, never its semantics.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::chat::{ChatProvider, ChatRequest, JsonSchemaSpec, ResponseFormat};
use crate::error::{ExtractError, Result};
use crate::message::Message;

const DEFAULT_INSTRUCTION: &str = "You are a data extraction engine. Extract structured data \
from the user's text so that it conforms to the provided JSON Schema. Reply with a single JSON \
value and nothing else: no prose, no code fences. Use null for fields the text does not mention.";

/// Extracts schema-conforming JSON from free-form text.
#[derive(Debug, Clone)]
pub struct Extractor<P> {
    provider: P,
    instruction: String,
    model: Option<String>,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl<P: ChatProvider> Extractor<P> {
    /// Create an extractor over a chat provider.
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            instruction: DEFAULT_INSTRUCTION.to_owned(),
            model: None,
            temperature: 0.0,
            max_tokens: None,
        }
    }

    /// Access the underlying provider.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Replace the default extraction instruction.
    #[must_use]
    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    /// Override the provider's default model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the sampling temperature. Defaults to `0.0`.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Limit the completion length.
    #[must_use]
    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Extract a JSON value from `text` guided by a schema given as JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidSchema`] when `schema_text` is not
    /// valid JSON, and otherwise propagates [`Extractor::extract_value`]
    /// failures.
    pub async fn extract_text(&self, text: &str, schema_text: &str) -> Result<Value> {
        let schema: Value = serde_json::from_str(schema_text)
            .map_err(|e| ExtractError::invalid_schema(e.to_string()))?;
        self.extract_value(text, &schema).await
    }

    /// Extract a JSON value from `text` guided by `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Llm`] on provider failure,
    /// [`ExtractError::EmptyResponse`] for a blank reply, and
    /// [`ExtractError::NoJson`] when no JSON value can be recovered.
    pub async fn extract_value(&self, text: &str, schema: &Value) -> Result<Value> {
        let prompt = format!(
            "JSON Schema:\n{}\n\nText:\n{text}",
            serde_json::to_string_pretty(schema)?
        );
        let mut request = ChatRequest::new(vec![
            Message::system(&self.instruction),
            Message::user(prompt),
        ])
        .temperature(self.temperature)
        .response_format(ResponseFormat::JsonObject);
        if let Some(model) = &self.model {
            request = request.model(model);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.max_tokens(max_tokens);
        }

        let response = self.provider.chat(request).await?;
        let output = response.text();
        tracing::debug!(
            provider = self.provider.name(),
            output_len = output.len(),
            "extraction reply"
        );
        if output.trim().is_empty() {
            return Err(ExtractError::EmptyResponse.into());
        }
        Ok(recover_json(output)?)
    }

    /// Extract a typed value, deriving the schema from `T`.
    ///
    /// # Errors
    ///
    /// As [`Extractor::extract_value`], plus [`ExtractError::Deserialize`]
    /// when the recovered JSON does not fit `T`.
    pub async fn extract<T>(&self, text: &str) -> Result<T>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let spec = JsonSchemaSpec::from_type::<T>();
        let value = self.extract_value(text, &spec.schema).await?;
        let typed = serde_json::from_value(value)
            .map_err(|e| ExtractError::Deserialize(e.to_string()))?;
        Ok(typed)
    }
}

/// Recover the first JSON value from model output.
///
/// Tries the whole output first, then strips Markdown code fences, then
/// scans for the first balanced `{...}` or `[...]` span. String literals
/// and escapes are honored during the scan.
///
/// # Errors
///
/// Returns [`ExtractError::NoJson`] when nothing parseable is found.
pub fn recover_json(output: &str) -> std::result::Result<Value, ExtractError> {
    let trimmed = output.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }
    if let Some(inner) = strip_fences(trimmed)
        && let Ok(value) = serde_json::from_str(inner)
    {
        return Ok(value);
    }
    if let Some(span) = balanced_span(trimmed)
        && let Ok(value) = serde_json::from_str(span)
    {
        return Ok(value);
    }
    Err(ExtractError::no_json(output))
}

/// Strip a ```` ```json ```` fenced block, returning its body.
fn strip_fences(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    // Skip the info string (e.g. "json") up to the end of the line.
    let body_start = after.find('\n')? + 1;
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// Find the first balanced JSON object or array span.
fn balanced_span(text: &str) -> Option<&str> {
    let open = text.find(['{', '['])?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[open..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::llms::MockChat;

    mod recover {
        use super::*;

        #[test]
        fn parses_clean_json() {
            let value = recover_json(r#"{"name": "Louvre"}"#).unwrap();
            assert_eq!(value["name"], "Louvre");
        }

        #[test]
        fn strips_code_fences() {
            let output = "```json\n{\"name\": \"Louvre\"}\n```";
            let value = recover_json(output).unwrap();
            assert_eq!(value["name"], "Louvre");
        }

        #[test]
        fn scans_past_leading_prose() {
            let output = r#"Here is the data you asked for: {"city": "Paris", "count": 3}. Enjoy!"#;
            let value = recover_json(output).unwrap();
            assert_eq!(value["city"], "Paris");
        }

        #[test]
        fn handles_braces_inside_strings() {
            let output = r#"result: {"note": "use {curly} braces", "ok": true} done"#;
            let value = recover_json(output).unwrap();
            assert_eq!(value["ok"], true);
        }

        #[test]
        fn recovers_arrays() {
            let output = "The list: [1, 2, 3]";
            let value = recover_json(output).unwrap();
            assert_eq!(value, serde_json::json!([1, 2, 3]));
        }

        #[test]
        fn rejects_output_without_json() {
            let err = recover_json("I could not find anything.").unwrap_err();
            assert!(matches!(err, ExtractError::NoJson(_)));
        }

        #[test]
        fn rejects_unbalanced_json() {
            let err = recover_json(r#"{"name": "Louv"#).unwrap_err();
            assert!(matches!(err, ExtractError::NoJson(_)));
        }
    }

    mod extractor {
        use super::*;

        #[tokio::test]
        async fn extracts_value_from_reply() {
            let mock = MockChat::reply(r#"{"name": "Eiffel Tower", "city": "Paris"}"#);
            let extractor = Extractor::new(mock);
            let value = extractor
                .extract_value(
                    "The Eiffel Tower stands in Paris.",
                    &serde_json::json!({"type": "object"}),
                )
                .await
                .unwrap();
            assert_eq!(value["city"], "Paris");
        }

        #[tokio::test]
        async fn prompt_carries_schema_and_text() {
            let mock = MockChat::reply("{}");
            let extractor = Extractor::new(mock);
            let schema = serde_json::json!({"type": "object", "required": ["name"]});
            extractor
                .extract_value("some text here", &schema)
                .await
                .unwrap();
            let requests = extractor.provider.requests();
            let user = requests[0].messages[1].text().unwrap();
            assert!(user.contains("required"));
            assert!(user.contains("some text here"));
        }

        #[tokio::test]
        async fn invalid_schema_text_is_rejected_before_any_call() {
            let mock = MockChat::reply("{}");
            let extractor = Extractor::new(mock);
            let err = extractor
                .extract_text("text", "{not valid json")
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                crate::Error::Extract(ExtractError::InvalidSchema(_))
            ));
            assert_eq!(extractor.provider.calls(), 0);
        }

        #[tokio::test]
        async fn empty_reply_is_reported() {
            let mock = MockChat::reply("   ");
            let extractor = Extractor::new(mock);
            let err = extractor
                .extract_value("text", &serde_json::json!({}))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                crate::Error::Extract(ExtractError::EmptyResponse)
            ));
        }

        #[tokio::test]
        async fn extract_typed_deserializes() {
            #[derive(serde::Deserialize, JsonSchema)]
            struct Attraction {
                name: String,
                city: String,
            }
            let mock = MockChat::reply(r#"{"name": "Louvre", "city": "Paris"}"#);
            let extractor = Extractor::new(mock);
            let attraction: Attraction = extractor.extract("The Louvre is in Paris.").await.unwrap();
            assert_eq!(attraction.name, "Louvre");
            assert_eq!(attraction.city, "Paris");
        }

        #[tokio::test]
        async fn extract_typed_reports_mismatch() {
            #[derive(Debug, serde::Deserialize, JsonSchema)]
            struct Out {
                #[allow(dead_code)]
                count: u32,
            }
            let mock = MockChat::reply(r#"{"count": "three"}"#);
            let extractor = Extractor::new(mock);
            let err = extractor.extract::<Out>("three things").await.unwrap_err();
            assert!(matches!(
                err,
                crate::Error::Extract(ExtractError::Deserialize(_))
            ));
        }
    }
}
