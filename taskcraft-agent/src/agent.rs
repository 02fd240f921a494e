//! Agent implementation - drives the CodeAct graph for one task at a time

use crate::metrics::{ExecutionMetrics, MetricsRecorder};
use crate::state::{strip_new_variables_suffix, CodeActOutput, StateMessage};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use taskcraft_codeact::error::{self, ErrorKind, Result};
use taskcraft_codeact::eval::{Evaluator, ScriptEvaluator};
use taskcraft_codeact::graph::{create_codeact, CodeActGraph, EXECUTION_OUTPUT_PREFIX};
use taskcraft_codeact::prompt::PromptBuilder;
use taskcraft_codeact::script::extract_code_blocks;
use taskcraft_codeact::provider::{ChatMessage, LlmProvider, Role};
use taskcraft_codeact::tools::{AppDefinition, ToolProvider, ToolSpec};
use taskcraft_codeact::variables::{VariablesHandle, VariablesManager};

/// Configuration for the agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Enable verbose logging during initialization
    pub verbose: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { verbose: true }
    }
}

/// Options for one `execute` call
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Maximum number of model rounds
    pub recursion_limit: usize,
    /// Print progress messages while the graph runs
    pub show_progress: bool,
    /// Prior chat history to continue from
    pub chat_messages: Option<Vec<ChatMessage>>,
    /// Variables supplied by the caller, kept across trims unconditionally
    pub initial_variables: Option<HashMap<String, serde_json::Value>>,
    /// How many newly created variables survive into the next turn (0 = all)
    pub keep_last_n_vars: usize,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            recursion_limit: 15,
            show_progress: true,
            chat_messages: None,
            initial_variables: None,
            keep_last_n_vars: 4,
        }
    }
}

/// Result of one `execute` call
#[derive(Debug)]
pub struct ExecuteOutcome {
    /// Final answer, or an error string when execution degraded
    pub answer: String,
    pub metrics: ExecutionMetrics,
    /// Structured state log: one record per execution plus a terminal record
    pub state_messages: Vec<StateMessage>,
    /// Full transcript for continuation, when the caller passed chat history
    pub chat_messages: Option<Vec<ChatMessage>>,
}

/// The task agent - assembles the graph from a tool provider and drives it.
///
/// ```no_run
/// use taskcraft_agent::{ExecuteOptions, TaskAgent};
/// use taskcraft_codeact::provider::{AnyProvider, ProviderConfig};
/// use taskcraft_codeact::tools::{DirectToolsProvider, ToolSpec};
///
/// # async fn run() -> taskcraft_codeact::Result<()> {
/// let mut tools = DirectToolsProvider::new();
/// tools.register(ToolSpec::new("echo", "Echo the arguments"), |args| async move { Ok(args) });
///
/// let model = AnyProvider::from_config(ProviderConfig::openai("sk-test"));
/// let mut agent = TaskAgent::new(tools, model);
/// agent.initialize().await?;
///
/// let outcome = agent.execute("Echo hello", ExecuteOptions::default()).await?;
/// println!("{}", outcome.answer);
/// # Ok(())
/// # }
/// ```
pub struct TaskAgent<P, L, E = ScriptEvaluator> {
    tools_provider: Arc<P>,
    model: Arc<L>,
    evaluator: Arc<E>,
    config: AgentConfig,
    prompt_override: Option<String>,
    allow_user_clarification: bool,
    return_to_user_cases: Option<Vec<String>>,
    instructions: Option<String>,
    task_loaded_from_file: bool,
    apps: Vec<AppDefinition>,
    tool_specs: Vec<ToolSpec>,
    variables: VariablesHandle,
    graph: Option<CodeActGraph<P, L, E>>,
    initialized: bool,
}

impl<P, L> TaskAgent<P, L, ScriptEvaluator>
where
    P: ToolProvider + 'static,
    L: LlmProvider + 'static,
{
    /// Create an agent with the default script evaluator
    pub fn new(tools_provider: P, model: L) -> Self {
        Self::with_evaluator(tools_provider, model, ScriptEvaluator::default())
    }
}

impl<P, L, E> TaskAgent<P, L, E>
where
    P: ToolProvider + 'static,
    L: LlmProvider + 'static,
    E: Evaluator + 'static,
{
    /// Create an agent with a custom evaluator (the `eval_fn` seam)
    pub fn with_evaluator(tools_provider: P, model: L, evaluator: E) -> Self {
        Self {
            tools_provider: Arc::new(tools_provider),
            model: Arc::new(model),
            evaluator: Arc::new(evaluator),
            config: AgentConfig::default(),
            prompt_override: None,
            allow_user_clarification: true,
            return_to_user_cases: None,
            instructions: None,
            task_loaded_from_file: false,
            apps: Vec::new(),
            tool_specs: Vec::new(),
            variables: VariablesManager::shared(),
            graph: None,
            initialized: false,
        }
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the assembled system prompt entirely
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt_override = Some(prompt.into());
        self
    }

    /// Add special instructions to the system prompt
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Replace the default return-to-user cases
    pub fn with_return_to_user_cases(mut self, cases: Vec<String>) -> Self {
        self.return_to_user_cases = Some(cases);
        self
    }

    /// Allow the model to ask the user for clarification (default: true)
    pub fn allow_user_clarification(mut self, allow: bool) -> Self {
        self.allow_user_clarification = allow;
        self
    }

    /// Note that the task text was loaded from a file
    pub fn task_loaded_from_file(mut self, loaded: bool) -> Self {
        self.task_loaded_from_file = loaded;
        self
    }

    /// Loaded apps (after initialization)
    pub fn apps(&self) -> &[AppDefinition] {
        &self.apps
    }

    /// Loaded tools (after initialization)
    pub fn tools(&self) -> &[ToolSpec] {
        &self.tool_specs
    }

    /// Shared variables context
    pub fn variables(&self) -> VariablesHandle {
        self.variables.clone()
    }

    /// Initialize the agent by loading tools from the provider and
    /// assembling the graph
    pub async fn initialize(&mut self) -> Result<()> {
        self.tools_provider.initialize().await?;

        self.apps = self.tools_provider.apps().await?;
        if self.config.verbose {
            let names: Vec<&str> = self.apps.iter().map(|a| a.name.as_str()).collect();
            println!("Found {} apps: {:?}", self.apps.len(), names);
        }

        self.tool_specs = self.tools_provider.tools().await?;
        if self.tool_specs.is_empty() {
            return Err(error::config_invalid("no tools available from tool provider")
                .with_operation("agent::initialize"));
        }
        if self.config.verbose {
            println!("Successfully loaded {} tools", self.tool_specs.len());
        }

        let system_prompt = match &self.prompt_override {
            Some(prompt) => prompt.clone(),
            None => {
                let mut builder = PromptBuilder::new(&self.tool_specs, &self.apps)
                    .allow_user_clarification(self.allow_user_clarification)
                    .task_loaded_from_file(self.task_loaded_from_file);
                if let Some(cases) = &self.return_to_user_cases {
                    builder = builder.with_return_cases(cases);
                }
                if let Some(instructions) = &self.instructions {
                    builder = builder.with_instructions(instructions);
                }
                builder.build()
            }
        };

        self.graph = Some(create_codeact(
            self.model.clone(),
            self.tools_provider.clone(),
            self.evaluator.clone(),
            system_prompt,
            self.variables.clone(),
        ));
        self.initialized = true;

        if self.config.verbose {
            println!("Agent initialized successfully");
        }
        Ok(())
    }

    /// Execute a task and return the answer, metrics, state log, and
    /// (when chat history was passed) the updated transcript.
    ///
    /// Execution errors do not fail the call: they degrade to an error
    /// string in `answer` plus partial metrics with `error` set.
    pub async fn execute(&self, task: &str, opts: ExecuteOptions) -> Result<ExecuteOutcome> {
        let graph = self.graph.as_ref().ok_or_else(|| {
            error::config_invalid("agent not initialized; call initialize() first")
                .with_operation("agent::execute")
        })?;

        let mut recorder = MetricsRecorder::new();

        // Seed caller-supplied variables; they are pinned across trims
        let mut initial_names: HashSet<String> = HashSet::new();
        if let Some(initial) = &opts.initial_variables {
            let mut vars = self.variables.write().unwrap();
            for (name, value) in initial {
                vars.add(name.clone(), value.clone(), "Provided by caller");
                initial_names.insert(name.clone());
            }
        }

        let mut messages: Vec<ChatMessage> = opts.chat_messages.clone().unwrap_or_default();
        let had_chat_history = opts.chat_messages.is_some();

        let mut task_content = task.to_string();
        if !initial_names.is_empty() && messages.is_empty() {
            // Fresh conversation: present the provided variables up front
            let names: Vec<String> = self
                .variables
                .read()
                .unwrap()
                .names_in_order()
                .into_iter()
                .filter(|n| initial_names.contains(n))
                .collect();
            let summary = self.variables.read().unwrap().summary(Some(&names));
            task_content = format!("{}\n\n## Available Variables\n\n{}", task, summary);
        }
        messages.push(ChatMessage::user(task_content));

        if opts.show_progress {
            println!("\n{}", "=".repeat(60));
            println!("Executing task: {}", task);
            println!("{}", "=".repeat(60));
        }

        let mut stream = graph.stream(messages, opts.recursion_limit);

        let mut step_count = 0usize;
        let mut all_code: Vec<String> = Vec::new();
        let mut all_execution_outputs: Vec<String> = Vec::new();
        let mut execution_steps: Vec<String> = Vec::new();
        let mut state_messages: Vec<StateMessage> = Vec::new();
        let mut last_code: Option<String> = None;
        let mut final_messages: Vec<ChatMessage> = Vec::new();

        while let Some(item) = stream.next().await {
            let state = match item {
                Ok(state) => state,
                Err(e) => {
                    let (answer, tag) = degrade(&e);
                    let metrics = recorder.finalize(
                        step_count,
                        self.tool_specs.len(),
                        self.apps.iter().map(|a| a.name.clone()).collect(),
                        Some(tag),
                    );
                    if opts.show_progress {
                        eprintln!("{}", answer);
                    }
                    return Ok(ExecuteOutcome {
                        answer,
                        metrics,
                        state_messages,
                        chat_messages: None,
                    });
                }
            };

            step_count += 1;

            if let (Some(model), Some(usage)) = (&state.model, &state.usage) {
                recorder.on_llm_end(model, usage);
            }

            if let Some(script) = &state.script {
                if !script.is_empty() && !all_code.contains(script) {
                    all_code.push(script.clone());
                    last_code = Some(script.clone());
                    execution_steps.push(format!("Step {}: Code generation", step_count));
                }
            }

            if let Some(last) = state.messages.last() {
                if last.role == Role::User && last.content.starts_with(EXECUTION_OUTPUT_PREFIX) {
                    let execution_output =
                        last.content.replacen(EXECUTION_OUTPUT_PREFIX, "", 1);
                    all_execution_outputs.push(execution_output.clone());
                    state_messages.push(StateMessage::execution_record(
                        step_count,
                        last_code.as_deref().unwrap_or(""),
                        &execution_output,
                    ));
                }

                if opts.show_progress {
                    let role = match last.role {
                        Role::Assistant => "AI",
                        _ => "User",
                    };
                    println!("\n[{}]: {}", role, truncate(&last.content, 5000));
                }
            }

            final_messages = state.messages;
        }

        if opts.show_progress {
            println!("\n{}", "=".repeat(60));
            println!("Execution completed in {} steps", step_count);
            println!("{}", "=".repeat(60));
        }

        // Final answer: last non-empty assistant message that is not a
        // script action, else the last execution output without the
        // variables appendix
        let mut final_answer = "No answer found".to_string();
        for msg in final_messages.iter().rev() {
            if msg.role == Role::Assistant
                && !msg.content.trim().is_empty()
                && extract_code_blocks(&msg.content).trim().is_empty()
            {
                final_answer = msg.content.clone();
                break;
            }
        }
        if final_answer == "No answer found" {
            if let Some(last_output) = all_execution_outputs.last() {
                let actual = strip_new_variables_suffix(last_output).trim();
                if !actual.is_empty() {
                    final_answer = actual.to_string();
                }
            }
        }

        let metrics = recorder.finalize(
            step_count,
            self.tool_specs.len(),
            self.apps.iter().map(|a| a.name.clone()).collect(),
            None,
        );

        // Retention: evict all but the last N newly created variables
        {
            let mut vars = self.variables.write().unwrap();
            vars.trim_new_vars(&initial_names, opts.keep_last_n_vars);
        }
        let final_context = self.variables.read().unwrap().snapshot();

        let output = CodeActOutput {
            code: all_code.join("\n\n"),
            execution_output: all_execution_outputs.join("\n\n"),
            steps_summary: execution_steps,
            summary: format!("Task completed successfully in {} steps", step_count),
            metrics: metrics.clone(),
            final_answer: final_answer.clone(),
        };
        state_messages.push(StateMessage::turn_record(&output, final_context));

        if opts.show_progress {
            println!("\nFINAL ANSWER:\n{}", final_answer);
            println!("\nExecution Metrics:");
            for line in metrics.summary_lines() {
                println!("   {}", line);
            }
        }

        let chat_messages = had_chat_history.then(|| final_messages);

        Ok(ExecuteOutcome {
            answer: final_answer,
            metrics,
            state_messages,
            chat_messages,
        })
    }
}

/// Map an execution error to the degraded answer string and metrics tag
fn degrade(e: &taskcraft_codeact::Error) -> (String, String) {
    match e.kind() {
        ErrorKind::EvalTimeout => ("Error: Execution timeout".to_string(), "timeout".to_string()),
        ErrorKind::Interrupted => (
            "Error: Interrupted by user".to_string(),
            "interrupted".to_string(),
        ),
        _ => (format!("Error during execution: {}", e), e.to_string()),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let clipped: String = s.chars().take(max_chars).collect();
        format!("{}...", clipped)
    }
}
