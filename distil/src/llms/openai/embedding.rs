//! Embeddings over the OpenAI wire protocol.

use async_trait::async_trait;
use serde::Deserialize;

use crate::embedding::EmbeddingProvider;
use crate::error::{LlmError, Result};

use super::client::OpenAiClient;

#[derive(Deserialize)]
struct WireResponse {
    data: Vec<WireEmbedding>,
}

#[derive(Deserialize)]
struct WireEmbedding {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "model": self.config.embedding_model,
            "input": texts,
        });
        tracing::debug!(inputs = texts.len(), "embedding request");
        let response: WireResponse = self.post_json("/embeddings", &body).await?;

        if response.data.len() != texts.len() {
            return Err(LlmError::response_format(
                format!("{} embeddings", texts.len()),
                format!("{}", response.data.len()),
            )
            .into());
        }

        // The API documents data as ordered, but sort by index to be exact.
        let mut data = response.data;
        data.sort_by_key(|e| e.index);
        Ok(data.into_iter().map(|e| e.embedding).collect())
    }

    fn name(&self) -> &str {
        Self::PROVIDER
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::llms::openai::OpenAiConfig;

    #[test]
    fn wire_response_parses() {
        let response: WireResponse = serde_json::from_str(
            r#"{"data": [
                {"index": 1, "embedding": [0.3, 0.4]},
                {"index": 0, "embedding": [0.1, 0.2]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(response.data.len(), 2);
        assert_eq!(response.data[0].index, 1);
    }

    #[tokio::test]
    async fn empty_input_short_circuits() {
        let client = OpenAiClient::new(OpenAiConfig::new("sk-test")).unwrap();
        let vectors = client.embed(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
