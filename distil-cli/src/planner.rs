//! Trip planning over an attraction index.
//!
//! A retriever tool exposes similarity search over an indexed attraction
//! corpus; the agent combines it with web-page reading to assemble an
//! itinerary.

use std::sync::Arc;

use distil::agent::{Agent, AgentRun};
use distil::chat::ChatProvider;
use distil::embedding::EmbeddingProvider;
use distil::error::{Result, ToolError};
use distil::index::VectorIndex;
use distil::tool::Tool;
use distil::webpage::ReadPageTool;
use schemars::JsonSchema;
use serde::Deserialize;

const PLANNER_PROMPT: &str = "You are a trip planning assistant. Use the search_attractions \
tool to find attractions relevant to the traveler's interests, and the read_page tool when a \
URL needs checking for details such as opening hours. Build a day-by-day itinerary, then call \
final_answer with the full plan.";

/// Arguments for the attraction retriever tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchArgs {
    /// Interest or topic to search for, e.g. "impressionist art".
    pub query: String,
}

/// Similarity search over an indexed attraction corpus.
pub struct RetrieverTool<E> {
    index: Arc<VectorIndex>,
    embedder: Arc<E>,
    top_k: usize,
}

impl<E> std::fmt::Debug for RetrieverTool<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrieverTool")
            .field("documents", &self.index.len())
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

impl<E: EmbeddingProvider> RetrieverTool<E> {
    /// Create a retriever returning the `top_k` best matches per query.
    #[must_use]
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<E>, top_k: usize) -> Self {
        Self {
            index,
            embedder,
            top_k,
        }
    }
}

#[async_trait::async_trait]
impl<E: EmbeddingProvider + 'static> Tool for RetrieverTool<E> {
    const NAME: &'static str = "search_attractions";

    type Args = SearchArgs;
    type Output = Vec<String>;

    fn description(&self) -> String {
        "Search the attraction database for entries matching an interest or topic. \
         Returns the best-matching attractions as text."
            .to_owned()
    }

    async fn call(&self, args: Self::Args) -> std::result::Result<Self::Output, ToolError> {
        let hits = self
            .index
            .search(self.embedder.as_ref(), &args.query, self.top_k)
            .await
            .map_err(|e| ToolError::execution(e.to_string()))?;
        Ok(hits.into_iter().map(|hit| hit.document.text).collect())
    }
}

/// Plan a trip with the agent loop.
///
/// # Errors
///
/// Propagates provider failures and the agent's step-budget error.
pub async fn plan_trip<P, E>(
    provider: P,
    embedder: Arc<E>,
    index: Arc<VectorIndex>,
    request: &str,
) -> Result<AgentRun>
where
    P: ChatProvider,
    E: EmbeddingProvider + 'static,
{
    let retriever = RetrieverTool::new(index, embedder, 5);
    let mut agent = Agent::new(provider)
        .system_prompt(PLANNER_PROMPT)
        .tool(retriever)
        .max_steps(12);
    if let Ok(read_page) = ReadPageTool::new() {
        agent = agent.tool(read_page);
    }
    agent.run(request).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use distil::index::Document;
    use distil::llms::{MockChat, MockEmbedder};
    use distil::message::{Message, ToolCall};

    async fn sample_index(embedder: &MockEmbedder) -> VectorIndex {
        let texts = vec![
            "Louvre (Paris): world's largest art museum".to_owned(),
            "Jardin du Luxembourg (Paris): public garden".to_owned(),
            "Musee d'Orsay (Paris): impressionist art museum".to_owned(),
        ];
        VectorIndex::from_texts(embedder, texts).await.unwrap()
    }

    #[tokio::test]
    async fn retriever_returns_top_matches() {
        let embedder = Arc::new(MockEmbedder::default());
        let index = Arc::new(sample_index(&embedder).await);
        let tool = RetrieverTool::new(index, embedder, 2);
        let hits = tool
            .call(SearchArgs {
                query: "Louvre (Paris): world's largest art museum".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].contains("Louvre"));
    }

    #[tokio::test]
    async fn retriever_on_empty_index_returns_nothing() {
        let embedder = Arc::new(MockEmbedder::default());
        let tool = RetrieverTool::new(Arc::new(VectorIndex::new()), embedder, 3);
        let hits = tool
            .call(SearchArgs {
                query: "anything".to_owned(),
            })
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn plan_trip_searches_then_answers() {
        let embedder = Arc::new(MockEmbedder::default());
        let mut index = VectorIndex::new();
        index.insert(Document::new(
            "Louvre (Paris): world's largest art museum",
            embedder.embed_one("Louvre").await.unwrap(),
        ));
        let mock = MockChat::script(vec![
            Message::assistant_tool_calls(
                None,
                vec![ToolCall::function(
                    "call_1",
                    "search_attractions",
                    r#"{"query": "art museums"}"#,
                )],
            ),
            Message::assistant_tool_calls(
                None,
                vec![ToolCall::function(
                    "call_2",
                    "final_answer",
                    r#"{"answer": "Day 1: visit the Louvre."}"#,
                )],
            ),
        ]);
        let run = plan_trip(mock, embedder, Arc::new(index), "one day of art in Paris")
            .await
            .unwrap();
        assert_eq!(run.answer, "Day 1: visit the Louvre.");
        assert_eq!(run.steps, 2);
    }
}
