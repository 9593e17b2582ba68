//! Bounded tool-calling agent loop.
//!
//! The agent hands the model a task and a tool catalog, executes the tool
//! calls it requests, and feeds results back until the model calls
//! `final_answer` or the step budget runs out. Models that emit a tool call
//! as JSON text instead of a structured call are accommodated; any other
//! plain reply counts as the final answer.

use serde_json::Value;
use uuid::Uuid;

use crate::chat::{ChatProvider, ChatRequest, ChatResponse};
use crate::error::{Error, Result};
use crate::message::{Message, ToolCall};
use crate::tool::{FINAL_ANSWER_TOOL, FinalAnswerTool, ToolBox};
use crate::usage::Usage;

const DEFAULT_MAX_STEPS: usize = 10;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant that solves tasks using tools. \
Think step by step. Call one tool at a time, observe the result, and continue. When the task is \
solved, call the final_answer tool with your answer.";

/// Outcome of a completed agent run.
#[derive(Debug, Clone)]
pub struct AgentRun {
    /// The final answer.
    pub answer: String,
    /// Completion requests issued.
    pub steps: usize,
    /// Aggregate token usage across all requests.
    pub usage: Usage,
}

/// A tool-calling agent over a chat provider.
#[derive(Debug)]
pub struct Agent<P> {
    provider: P,
    tools: ToolBox,
    system_prompt: String,
    max_steps: usize,
}

impl<P: ChatProvider> Agent<P> {
    /// Create an agent with the `final_answer` tool pre-registered.
    #[must_use]
    pub fn new(provider: P) -> Self {
        let mut tools = ToolBox::new();
        tools.add(FinalAnswerTool);
        Self {
            provider,
            tools,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Register a tool.
    #[must_use]
    pub fn tool<T: crate::tool::Tool>(mut self, tool: T) -> Self {
        self.tools.add(tool);
        self
    }

    /// Replace the default system prompt.
    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set the step budget. Defaults to 10.
    #[must_use]
    pub const fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Run the agent on a task until it produces a final answer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MaxSteps`] when the step budget is exhausted, and
    /// propagates provider failures.
    pub async fn run(&self, task: &str) -> Result<AgentRun> {
        let mut messages = vec![
            Message::system(&self.system_prompt),
            Message::user(task),
        ];
        let mut usage = Usage::default();

        for step in 0..self.max_steps {
            let request = ChatRequest::new(messages.clone()).tools(self.tools.definitions());
            let response = self.provider.chat(request).await?;
            if let Some(u) = &response.usage {
                usage.add(u);
            }

            let calls = Self::tool_calls_of(&response);
            if calls.is_empty() {
                // No tool call at all: the reply itself is the answer.
                return Ok(AgentRun {
                    answer: response.text().to_owned(),
                    steps: step + 1,
                    usage,
                });
            }

            messages.push(Message::assistant_tool_calls(
                response.message.content.clone(),
                calls.clone(),
            ));
            for call in calls {
                tracing::debug!(step, tool = call.name(), "tool call");
                if call.name() == FINAL_ANSWER_TOOL {
                    return Ok(AgentRun {
                        answer: Self::final_answer_of(&call),
                        steps: step + 1,
                        usage,
                    });
                }
                let result = match self.tools.call(call.name(), call.arguments()).await {
                    Ok(output) => output,
                    // Tool failures go back to the model so it can adjust.
                    Err(e) => format!("Error: {e}"),
                };
                messages.push(Message::tool(call.id.clone(), result));
            }
        }

        Err(Error::max_steps(self.max_steps))
    }

    /// Structured tool calls, or a single call parsed from the reply text.
    fn tool_calls_of(response: &ChatResponse) -> Vec<ToolCall> {
        if let Some(calls) = response.tool_calls() {
            return calls.to_vec();
        }
        parse_textual_call(response.text()).into_iter().collect()
    }

    fn final_answer_of(call: &ToolCall) -> String {
        let args = call.arguments();
        args.get("answer")
            .and_then(Value::as_str)
            .map_or_else(|| args.to_string(), str::to_owned)
    }
}

/// Parse a tool call a model wrote out as JSON text.
///
/// Accepts `{"name": "...", "arguments": {...}}`, with the tool name also
/// honored under a `"tool"` key.
fn parse_textual_call(text: &str) -> Option<ToolCall> {
    let value = crate::extract::recover_json(text).ok()?;
    let name = value
        .get("name")
        .or_else(|| value.get("tool"))?
        .as_str()?
        .to_owned();
    let arguments = value
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    Some(ToolCall::function(
        format!("call_{}", Uuid::new_v4().simple()),
        name,
        arguments.to_string(),
    ))
}
