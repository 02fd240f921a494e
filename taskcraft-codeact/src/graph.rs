//! # CodeAct Graph
//!
//! The code-generation/execution loop, exposed as a stream of intermediate
//! state snapshots. Each round: the model is called with the conversation so
//! far, its reply is scanned for a fenced action script, the script is
//! evaluated against the tools, and the execution output is fed back as the
//! next message. A reply without a script ends the loop - that reply is the
//! final answer.
//!
//! Consumers iterate the yielded values and pattern-match on `script` and
//! the trailing message to extract generated code and execution output.

use crate::error::{self, Result};
use crate::eval::Evaluator;
use crate::provider::{ChatMessage, CompletionRequest, LlmProvider, Usage};
use crate::script::extract_code_blocks;
use crate::tools::ToolProvider;
use crate::variables::VariablesHandle;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

/// Prefix of messages carrying evaluation results back to the model
pub const EXECUTION_OUTPUT_PREFIX: &str = "Execution output:\n";

/// A values snapshot yielded after each graph node
#[derive(Debug, Clone)]
pub struct GraphState {
    /// Model round this snapshot belongs to (1-based)
    pub step: usize,
    /// Script extracted from the model reply, when this snapshot is the
    /// code-generation node
    pub script: Option<String>,
    /// Conversation so far (excluding the system prompt)
    pub messages: Vec<ChatMessage>,
    /// Current variables context
    pub variables: HashMap<String, serde_json::Value>,
    /// Model that served this round, set on model-call snapshots
    pub model: Option<String>,
    /// Token usage of this round, set on model-call snapshots
    pub usage: Option<Usage>,
}

/// Receiver for graph state snapshots
pub struct StateStream {
    inner: Pin<Box<dyn futures_core::Stream<Item = Result<GraphState>> + Send>>,
}

impl StateStream {
    pub fn new<S>(stream: S) -> Self
    where
        S: futures_core::Stream<Item = Result<GraphState>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    /// Next state snapshot, or None when the loop has ended
    pub async fn next(&mut self) -> Option<Result<GraphState>> {
        use futures_util::StreamExt;
        self.inner.next().await
    }
}

/// The compiled code-generation/execution graph
pub struct CodeActGraph<P, L, E> {
    model: Arc<L>,
    tools: Arc<P>,
    evaluator: Arc<E>,
    system_prompt: String,
    variables: VariablesHandle,
}

/// Assemble a graph from a model, tools, an evaluator, and a system prompt
pub fn create_codeact<P, L, E>(
    model: Arc<L>,
    tools: Arc<P>,
    evaluator: Arc<E>,
    system_prompt: String,
    variables: VariablesHandle,
) -> CodeActGraph<P, L, E>
where
    P: ToolProvider,
    L: LlmProvider,
    E: Evaluator,
{
    CodeActGraph {
        model,
        tools,
        evaluator,
        system_prompt,
        variables,
    }
}

impl<P, L, E> CodeActGraph<P, L, E>
where
    P: ToolProvider + 'static,
    L: LlmProvider + 'static,
    E: Evaluator + 'static,
{
    /// System prompt the graph was compiled with
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Shared variables context
    pub fn variables(&self) -> VariablesHandle {
        self.variables.clone()
    }

    /// Drive the loop, yielding a state snapshot after every node.
    ///
    /// `recursion_limit` bounds the number of model rounds; when it is
    /// reached the stream simply ends and the consumer answers from what
    /// it accumulated.
    pub fn stream(&self, initial_messages: Vec<ChatMessage>, recursion_limit: usize) -> StateStream {
        let model = self.model.clone();
        let tools = self.tools.clone();
        let evaluator = self.evaluator.clone();
        let system_prompt = self.system_prompt.clone();
        let variables = self.variables.clone();

        let stream = async_stream::stream! {
            let mut messages = initial_messages;
            let mut round = 0usize;

            loop {
                if round >= recursion_limit {
                    break;
                }
                round += 1;

                let mut request_messages = Vec::with_capacity(messages.len() + 1);
                request_messages.push(ChatMessage::system(&system_prompt));
                request_messages.extend(messages.iter().cloned());

                let response = match model.complete(CompletionRequest::new(request_messages)).await {
                    Ok(response) => response,
                    Err(e) => {
                        yield Err(error::inference_failed(e.to_string())
                            .with_operation("graph::call_model")
                            .with_context("round", round.to_string()));
                        return;
                    }
                };

                let content = response.content.unwrap_or_default();
                messages.push(ChatMessage::assistant(&content));

                // Snapshots are taken before yielding so no lock guard is
                // alive across a suspension point
                let snapshot = variables.read().unwrap().snapshot();
                yield Ok(GraphState {
                    step: round,
                    script: None,
                    messages: messages.clone(),
                    variables: snapshot,
                    model: Some(response.model.clone()),
                    usage: Some(response.usage.clone()),
                });

                let script = extract_code_blocks(&content);
                if script.trim().is_empty() {
                    // Plain text reply - the final answer
                    break;
                }

                let snapshot = variables.read().unwrap().snapshot();
                yield Ok(GraphState {
                    step: round,
                    script: Some(script.clone()),
                    messages: messages.clone(),
                    variables: snapshot,
                    model: None,
                    usage: None,
                });

                let outcome = match evaluator.eval(&script, tools.as_ref(), &variables).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        yield Err(e.with_operation("graph::execute"));
                        return;
                    }
                };

                messages.push(ChatMessage::user(format!(
                    "{}{}",
                    EXECUTION_OUTPUT_PREFIX, outcome.output
                )));

                let snapshot = variables.read().unwrap().snapshot();
                yield Ok(GraphState {
                    step: round,
                    script: None,
                    messages: messages.clone(),
                    variables: snapshot,
                    model: None,
                    usage: None,
                });
            }
        };

        StateStream::new(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::ScriptEvaluator;
    use crate::provider::{CompletionResponse, FinishReason, ProviderError};
    use crate::tools::{DirectToolsProvider, ToolSpec};
    use crate::variables::VariablesManager;
    use std::sync::Mutex;

    /// Provider that replays a fixed list of responses
    struct ScriptedProvider {
        responses: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<&str>) -> Self {
            let mut responses: Vec<String> = responses.into_iter().map(String::from).collect();
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn models(&self) -> Vec<String> {
            vec!["scripted-1".into()]
        }

        fn default_model(&self) -> &str {
            "scripted-1"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            let content = self
                .responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| ProviderError::Other("no scripted responses left".into()))?;

            Ok(CompletionResponse {
                id: "resp".into(),
                model: "scripted-1".into(),
                content: Some(content),
                finish_reason: FinishReason::Stop,
                usage: Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                },
            })
        }
    }

    fn echo_tools() -> Arc<DirectToolsProvider> {
        let mut provider = DirectToolsProvider::new();
        provider.register(ToolSpec::new("echo", "Echo the arguments"), |args| async move {
            Ok(args)
        });
        Arc::new(provider)
    }

    fn graph_with(
        responses: Vec<&str>,
    ) -> CodeActGraph<DirectToolsProvider, ScriptedProvider, ScriptEvaluator> {
        create_codeact(
            Arc::new(ScriptedProvider::new(responses)),
            echo_tools(),
            Arc::new(ScriptEvaluator::default()),
            "You act by emitting scripts.".into(),
            VariablesManager::shared(),
        )
    }

    #[tokio::test]
    async fn test_single_round_plain_answer() {
        let graph = graph_with(vec!["The answer is 42."]);
        let mut stream = graph.stream(vec![ChatMessage::user("What is the answer?")], 15);

        let state = stream.next().await.unwrap().unwrap();
        assert_eq!(state.step, 1);
        assert!(state.script.is_none());
        assert_eq!(state.messages.last().unwrap().content, "The answer is 42.");
        assert!(state.usage.is_some());

        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_script_round_then_answer() {
        let graph = graph_with(vec![
            "Running the tool:\n```json\n[{\"op\": \"CALL\", \"tool\": \"echo\", \"args\": {\"msg\": \"hi\"}, \"store_to\": \"echoed\"},\n {\"op\": \"PRINT\", \"value\": \"{echoed}\"}]\n```",
            "Done: the tool echoed hi.",
        ]);
        let mut stream = graph.stream(vec![ChatMessage::user("echo hi")], 15);

        let mut scripts = Vec::new();
        let mut exec_outputs = Vec::new();
        let mut final_messages = Vec::new();

        while let Some(state) = stream.next().await {
            let state = state.unwrap();
            if let Some(script) = &state.script {
                scripts.push(script.clone());
            }
            if let Some(last) = state.messages.last() {
                if last.content.starts_with(EXECUTION_OUTPUT_PREFIX) {
                    exec_outputs.push(last.content.clone());
                }
            }
            final_messages = state.messages;
        }

        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("\"op\": \"CALL\""));
        assert!(!exec_outputs.is_empty());
        assert!(exec_outputs[0].contains("msg"));
        assert_eq!(final_messages.last().unwrap().content, "Done: the tool echoed hi.");

        // The stored variable survives in the shared context
        assert!(graph.variables().read().unwrap().contains("echoed"));
    }

    #[tokio::test]
    async fn test_recursion_limit_ends_stream() {
        let script_reply =
            "```json\n[{\"op\": \"PRINT\", \"value\": \"looping\"}]\n```";
        let graph = graph_with(vec![script_reply; 10]);
        let mut stream = graph.stream(vec![ChatMessage::user("loop forever")], 3);

        let mut model_rounds = 0;
        while let Some(state) = stream.next().await {
            let state = state.unwrap();
            if state.usage.is_some() {
                model_rounds += 1;
            }
        }

        assert_eq!(model_rounds, 3);
    }

    #[tokio::test]
    async fn test_provider_error_surfaces() {
        let graph = graph_with(vec![]);
        let mut stream = graph.stream(vec![ChatMessage::user("anything")], 15);

        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InferenceFailed);
        assert!(stream.next().await.is_none());
    }
}
