//! # taskcraft CodeAct runtime
//!
//! The runtime a task agent drives: an LLM proposes action scripts, the
//! runtime evaluates them against bound tools, and the loop continues until
//! the model answers in plain text.
//!
//! ## Core Concepts
//! - **Provider**: Trait-based LLM communication (OpenAI-compatible, Anthropic)
//! - **Tools**: Tool provider interface (in-process bindings or a remote registry)
//! - **Variables**: Named values produced by script execution, summarized for prompts
//! - **Scripts**: Fenced action scripts extracted from model output
//! - **Graph**: The code-generation/execution loop, streamed as state snapshots

pub mod error;
pub mod eval;
pub mod graph;
pub mod prompt;
pub mod provider;
pub mod registry;
pub mod script;
pub mod tools;
pub mod variables;

pub use error::{Error, ErrorKind, ErrorStatus, Result};
pub use eval::{EvalOutcome, Evaluator, ScriptEvaluator};
pub use graph::{create_codeact, CodeActGraph, GraphState, StateStream};
pub use prompt::PromptBuilder;
pub use provider::{
    AnthropicProvider, AnyProvider, ChatMessage, CompletionRequest, CompletionResponse,
    FinishReason, LlmProvider, OpenAIProvider, ProviderConfig, ProviderError, ProviderType, Role,
    Usage, UsageTracker,
};
pub use registry::RegistryProvider;
pub use script::{extract_code_blocks, ActionScript, Statement};
pub use tools::{AppDefinition, DirectToolsProvider, ToolProvider, ToolSpec};
pub use variables::{VariablesHandle, VariablesManager};
