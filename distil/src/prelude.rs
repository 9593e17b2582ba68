//! Convenient single-import surface.
//!
//! ```ignore
//! use distil::prelude::*;
//! ```

pub use crate::agent::{Agent, AgentRun};
pub use crate::chat::{
    ChatProvider, ChatProviderExt, ChatRequest, ChatResponse, JsonSchemaSpec, ResponseFormat,
    StopReason,
};
pub use crate::embedding::{EmbeddingProvider, cosine_similarity};
pub use crate::error::{Error, ExtractError, LlmError, Result, ToolError};
pub use crate::extract::Extractor;
pub use crate::index::{Document, Scored, VectorIndex};
pub use crate::llms::{MockChat, MockEmbedder, OpenAiClient, OpenAiConfig};
pub use crate::message::{Message, Role, ToolCall};
pub use crate::tool::{Tool, ToolBox, ToolDefinition};
pub use crate::usage::Usage;
pub use crate::webpage::{PageReader, ReadPageTool};
