//! Token usage accounting reported by completion providers.

use serde::{Deserialize, Serialize};

/// Token counts for a single completion request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt.
    #[serde(alias = "input_tokens", default)]
    pub prompt_tokens: u32,
    /// Tokens produced in the completion.
    #[serde(alias = "output_tokens", default)]
    pub completion_tokens: u32,
    /// Total tokens for the request.
    #[serde(default)]
    pub total_tokens: u32,
}

impl Usage {
    /// Create a usage record from prompt and completion counts.
    #[must_use]
    pub const fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Accumulate another usage record into this one.
    pub fn add(&mut self, other: &Self) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_computes_total() {
        let usage = Usage::new(100, 25);
        assert_eq!(usage.total_tokens, 125);
    }

    #[test]
    fn add_accumulates() {
        let mut usage = Usage::new(10, 5);
        usage.add(&Usage::new(20, 10));
        assert_eq!(usage.prompt_tokens, 30);
        assert_eq!(usage.completion_tokens, 15);
        assert_eq!(usage.total_tokens, 45);
    }

    #[test]
    fn deserializes_input_output_aliases() {
        let usage: Usage =
            serde_json::from_str(r#"{"input_tokens": 7, "output_tokens": 3}"#).unwrap();
        assert_eq!(usage.prompt_tokens, 7);
        assert_eq!(usage.completion_tokens, 3);
    }

    #[test]
    fn missing_fields_default_to_zero() {
        let usage: Usage = serde_json::from_str("{}").unwrap();
        assert_eq!(usage, Usage::default());
    }
}
