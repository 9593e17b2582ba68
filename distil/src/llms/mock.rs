//! Scripted providers for tests and offline development.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::chat::{ChatProvider, ChatRequest, ChatResponse, StopReason};
use crate::embedding::EmbeddingProvider;
use crate::error::{LlmError, Result};
use crate::message::Message;
use crate::usage::Usage;

/// A chat provider that replays scripted assistant messages in order.
///
/// Once the script is exhausted the last message repeats, so a single-reply
/// mock can serve any number of calls. Every request is recorded for
/// inspection.
#[derive(Debug, Default)]
pub struct MockChat {
    replies: Vec<Message>,
    cursor: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChat {
    /// Create a mock that always replies with the given text.
    #[must_use]
    pub fn reply(text: impl Into<String>) -> Self {
        Self::script(vec![Message::assistant(text)])
    }

    /// Create a mock replaying the given assistant messages in order.
    #[must_use]
    pub fn script(replies: Vec<Message>) -> Self {
        Self {
            replies,
            cursor: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of chat calls served so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    /// Snapshot of every request received, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatProvider for MockChat {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        let message = self
            .replies
            .get(index.min(self.replies.len().saturating_sub(1)))
            .cloned()
            .ok_or_else(|| LlmError::provider("mock", "no scripted replies"))?;
        let stop_reason = if message.has_tool_calls() {
            StopReason::ToolCalls
        } else {
            StopReason::Stop
        };
        Ok(ChatResponse {
            message,
            model: "mock".to_owned(),
            stop_reason,
            usage: Some(Usage::new(1, 1)),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A deterministic embedder that hashes text into unit vectors.
///
/// Identical inputs map to identical vectors, so similarity-based code can
/// be tested without a real embedding model.
#[derive(Debug, Clone, Copy)]
pub struct MockEmbedder {
    dimensions: usize,
}

impl MockEmbedder {
    /// Create an embedder producing vectors of the given dimension.
    #[must_use]
    pub const fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        if self.dimensions == 0 {
            return vector;
        }
        for (i, byte) in text.bytes().enumerate() {
            let slot = (i + usize::from(byte)) % self.dimensions;
            vector[slot] += f32::from(byte) / 255.0;
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
