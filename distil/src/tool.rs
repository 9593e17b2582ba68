//! Tools the agent loop can expose to the model.
//!
//! [`Tool`] is the strongly-typed seam: arguments deserialize from the JSON
//! the model sends, output serializes back into the tool result message.
//! [`ToolBox`] erases the types so heterogeneous tools can live in one
//! registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Serialize, Serializer, de::DeserializeOwned, ser::SerializeMap};
use serde_json::Value;

use crate::error::ToolError;

/// Name of the built-in tool that terminates an agent run.
pub const FINAL_ANSWER_TOOL: &str = "final_answer";

/// A strongly-typed tool callable by the model.
#[async_trait]
pub trait Tool: Send + Sync + 'static {
    /// Unique tool name, as advertised to the model.
    const NAME: &'static str;

    /// Deserialized argument type.
    type Args: DeserializeOwned + JsonSchema + Send;
    /// Serialized result type.
    type Output: Serialize + Send;

    /// Human-readable description of what the tool does.
    fn description(&self) -> String;

    /// Execute the tool.
    async fn call(&self, args: Self::Args) -> Result<Self::Output, ToolError>;
}

/// Wire-format description of a tool, serialized in the OpenAI function
/// calling shape.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// What the tool does.
    pub description: String,
    /// JSON Schema of the arguments object.
    pub parameters: Value,
}

impl ToolDefinition {
    /// Build a definition for a typed tool, deriving the parameter schema
    /// from its argument type.
    #[must_use]
    pub fn of<T: Tool>(tool: &T) -> Self {
        let mut parameters =
            serde_json::to_value(schemars::schema_for!(T::Args)).unwrap_or_default();
        if let Some(obj) = parameters.as_object_mut() {
            obj.remove("$schema");
            obj.remove("title");
        }
        Self {
            name: T::NAME.to_owned(),
            description: tool.description(),
            parameters,
        }
    }
}

impl Serialize for ToolDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let function = serde_json::json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.parameters,
        });
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", "function")?;
        map.serialize_entry("function", &function)?;
        map.end()
    }
}

/// Object-safe adapter over [`Tool`].
#[async_trait]
pub trait DynTool: Send + Sync {
    /// Tool name.
    fn name(&self) -> &str;
    /// Wire-format definition.
    fn definition(&self) -> ToolDefinition;
    /// Execute with JSON arguments, returning the JSON-encoded result.
    async fn call_json(&self, args: Value) -> Result<String, ToolError>;
}

struct Typed<T>(T);

#[async_trait]
impl<T: Tool> DynTool for Typed<T> {
    fn name(&self) -> &str {
        T::NAME
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::of(&self.0)
    }

    async fn call_json(&self, args: Value) -> Result<String, ToolError> {
        let args: T::Args = serde_json::from_value(args)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        let output = self.0.call(args).await?;
        serde_json::to_string(&output).map_err(|e| ToolError::Execution(e.to_string()))
    }
}

/// A registry of tools, keyed by name.
#[derive(Default, Clone)]
pub struct ToolBox {
    tools: HashMap<String, Arc<dyn DynTool>>,
}

impl ToolBox {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a typed tool, replacing any previous tool with the same name.
    #[must_use]
    pub fn with<T: Tool>(mut self, tool: T) -> Self {
        self.add(tool);
        self
    }

    /// Register a typed tool in place.
    pub fn add<T: Tool>(&mut self, tool: T) {
        self.tools
            .insert(T::NAME.to_owned(), Arc::new(Typed(tool)));
    }

    /// Look up a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn DynTool>> {
        self.tools.get(name)
    }

    /// Wire-format definitions of every registered tool.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool by name with JSON arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::NotFound`] for unknown names and propagates the
    /// tool's own failure otherwise.
    pub async fn call(&self, name: &str, args: Value) -> Result<String, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_owned()))?;
        tool.call_json(args).await
    }
}

impl std::fmt::Debug for ToolBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ToolBox").field("tools", &names).finish()
    }
}

/// Arguments to the built-in final-answer tool.
#[derive(Debug, serde::Deserialize, JsonSchema)]
pub struct FinalAnswerArgs {
    /// The final answer to return to the caller.
    pub answer: String,
}

/// Built-in tool the model calls to finish an agent run.
///
/// The agent loop intercepts calls to this tool and returns the answer
/// instead of executing it, so [`Tool::call`] only echoes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinalAnswerTool;

#[async_trait]
impl Tool for FinalAnswerTool {
    const NAME: &'static str = FINAL_ANSWER_TOOL;

    type Args = FinalAnswerArgs;
    type Output = String;

    fn description(&self) -> String {
        "Provide the final answer to the user's request. \
         Call this exactly once, when the task is complete."
            .to_owned()
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, ToolError> {
        Ok(args.answer)
    }
}
