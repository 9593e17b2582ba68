//! Distil - schema-guided structured extraction over LLM completion APIs.
//!
//! This crate turns free-form text into JSON conforming to a caller-supplied
//! JSON Schema by composing a prompt, issuing a single chat completion
//! request, and recovering the JSON value from the model's reply. It also
//! ships the supporting pieces a small extraction application needs: an
//! OpenAI-compatible client, text embeddings with an in-memory vector index,
//! a web-page reader, and a bounded tool-calling agent loop.

pub mod agent;
pub mod chat;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod index;
pub mod llms;
pub mod message;
pub mod prelude;
pub mod tool;
pub mod usage;
pub mod webpage;

pub use error::{Error, ExtractError, LlmError, Result, ToolError};
