//! OpenAI-compatible provider.
//!
//! Works against the official API and against any server exposing the same
//! wire protocol (vLLM, Ollama, LiteLLM proxies) by overriding the base URL.

mod chat;
mod client;
mod config;
mod embedding;

pub use client::OpenAiClient;
pub use config::OpenAiConfig;
