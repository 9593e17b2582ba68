//! LLM provider implementations.
//!
//! [`openai`] speaks the OpenAI-compatible chat completion and embeddings
//! wire protocol; [`mock`] provides scripted providers for tests.

pub mod mock;
pub mod openai;

pub use mock::{MockChat, MockEmbedder};
pub use openai::{OpenAiClient, OpenAiConfig};
