//! # Script Evaluation
//!
//! The evaluator seam between the graph and "code execution". The default
//! `ScriptEvaluator` runs action scripts against the tool provider; custom
//! evaluators can be injected to change what generated code means.
//!
//! Evaluation never hard-fails on script problems: parse errors, tool
//! failures, and timeouts degrade to error text in the execution output so
//! the model can read them and recover. The whole evaluation runs under a
//! wall-clock timeout.

use crate::error::Result;
use crate::script::{resolve_refs, ActionScript, Statement};
use crate::tools::ToolProvider;
use crate::variables::VariablesHandle;
use std::collections::HashMap;
use std::time::Duration;

/// Default wall-clock bound for one evaluation
pub const DEFAULT_EVAL_TIMEOUT_SECS: u64 = 30;

/// Output added to the execution transcript when a script prints nothing
pub const NO_OUTPUT_SENTINEL: &str = "<code ran, no output printed to stdout>";

/// Header introducing the new-variables summary in execution output
pub const NEW_VARIABLES_HEADER: &str = "## New Variables Created:";

/// Result of evaluating one script
#[derive(Debug, Clone, Default)]
pub struct EvalOutcome {
    /// Printed output, error text, and the new-variables appendix
    pub output: String,
    /// Variables created by this evaluation (name -> final value)
    pub new_variables: HashMap<String, serde_json::Value>,
}

/// The evaluation seam - what it means to "run" generated code
#[allow(async_fn_in_trait)]
pub trait Evaluator: Send + Sync {
    fn eval<P: ToolProvider>(
        &self,
        code: &str,
        tools: &P,
        variables: &VariablesHandle,
    ) -> impl std::future::Future<Output = Result<EvalOutcome>> + Send;
}

/// Default evaluator: executes action scripts statement by statement
#[derive(Debug, Clone)]
pub struct ScriptEvaluator {
    pub timeout_secs: u64,
}

impl Default for ScriptEvaluator {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_EVAL_TIMEOUT_SECS,
        }
    }
}

impl ScriptEvaluator {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }

    async fn run_script<P: ToolProvider>(
        &self,
        code: &str,
        tools: &P,
        variables: &VariablesHandle,
    ) -> EvalOutcome {
        let script = match ActionScript::parse(code) {
            Ok(script) => script,
            Err(e) => {
                return EvalOutcome {
                    output: format!("Error during execution: {}", e),
                    new_variables: HashMap::new(),
                }
            }
        };

        let existing: Vec<String> = variables.read().unwrap().names_in_order();
        let mut created_order: Vec<String> = Vec::new();
        let mut new_variables: HashMap<String, serde_json::Value> = HashMap::new();
        let mut output = String::new();

        let mut record = |name: &str, value: &serde_json::Value| {
            if !existing.iter().any(|n| n == name) {
                if !created_order.iter().any(|n| n == name) {
                    created_order.push(name.to_string());
                }
                new_variables.insert(name.to_string(), value.clone());
            }
        };

        for statement in &script.statements {
            match statement {
                Statement::Let { name, value } => {
                    let resolved = {
                        let vars = variables.read().unwrap();
                        resolve_refs(value, &vars)
                    };
                    record(name.as_str(), &resolved);
                    variables.write().unwrap().add(
                        name.clone(),
                        resolved,
                        "Created during script execution",
                    );
                }
                Statement::Call { tool, args, store_to } => {
                    let resolved_args = {
                        let vars = variables.read().unwrap();
                        resolve_refs(args, &vars)
                    };

                    match tools.call(tool, resolved_args).await {
                        Ok(result) => {
                            if let Some(name) = store_to {
                                record(name.as_str(), &result);
                                variables.write().unwrap().add(
                                    name.clone(),
                                    result,
                                    "Created during script execution",
                                );
                            }
                        }
                        Err(e) => {
                            // Surface the failure to the model and stop, like
                            // an uncaught exception would
                            output.push_str(&format!("Error during execution: {}\n", e));
                            break;
                        }
                    }
                }
                Statement::Print { value } => {
                    let resolved = {
                        let vars = variables.read().unwrap();
                        resolve_refs(value, &vars)
                    };
                    let line = match resolved {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    output.push_str(&line);
                    output.push('\n');
                }
            }
        }

        let mut output = if output.trim().is_empty() {
            NO_OUTPUT_SENTINEL.to_string()
        } else {
            output.trim_end().to_string()
        };

        if !created_order.is_empty() {
            let summary = variables.read().unwrap().summary(Some(&created_order));
            if summary != "# No variables stored" {
                output.push_str(&format!("\n\n{}\n{}", NEW_VARIABLES_HEADER, summary));
            }
        }

        EvalOutcome {
            output,
            new_variables,
        }
    }
}

impl Evaluator for ScriptEvaluator {
    async fn eval<P: ToolProvider>(
        &self,
        code: &str,
        tools: &P,
        variables: &VariablesHandle,
    ) -> Result<EvalOutcome> {
        let bound = Duration::from_secs(self.timeout_secs);
        match tokio::time::timeout(bound, self.run_script(code, tools, variables)).await {
            Ok(outcome) => Ok(outcome),
            Err(_) => Ok(EvalOutcome {
                output: format!(
                    "Error during execution: Execution timed out after {} seconds",
                    self.timeout_secs
                ),
                new_variables: HashMap::new(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{DirectToolsProvider, ToolSpec};
    use crate::variables::VariablesManager;
    use serde_json::json;

    fn math_provider() -> DirectToolsProvider {
        let mut provider = DirectToolsProvider::new();
        provider.register(ToolSpec::new("double", "Double a number"), |args| async move {
            let n = args["n"].as_i64().unwrap_or(0);
            Ok(json!({ "value": n * 2 }))
        });
        provider.register(ToolSpec::new("fail", "Always fails"), |_| async move {
            Err(crate::error::tool_failed("fail", "deliberate failure"))
        });
        provider.register(ToolSpec::new("sleep", "Sleeps forever"), |_| async move {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok(json!(null))
        });
        provider
    }

    #[tokio::test]
    async fn test_call_store_print() {
        let provider = math_provider();
        let vars = VariablesManager::shared();
        let evaluator = ScriptEvaluator::default();

        let code = r#"[
            {"op": "CALL", "tool": "double", "args": {"n": 21}, "store_to": "result"},
            {"op": "PRINT", "value": "{result}"}
        ]"#;

        let outcome = evaluator.eval(code, &provider, &vars).await.unwrap();
        assert!(outcome.output.contains("42"));
        assert!(outcome.output.contains(NEW_VARIABLES_HEADER));
        assert!(outcome.output.contains("## result"));
        assert_eq!(outcome.new_variables["result"], json!({"value": 42}));
        assert!(vars.read().unwrap().contains("result"));
    }

    #[tokio::test]
    async fn test_no_output_sentinel() {
        let provider = math_provider();
        let vars = VariablesManager::shared();
        let evaluator = ScriptEvaluator::default();

        let code = r#"[{"op": "CALL", "tool": "double", "args": {"n": 1}}]"#;
        let outcome = evaluator.eval(code, &provider, &vars).await.unwrap();
        assert!(outcome.output.starts_with(NO_OUTPUT_SENTINEL));
        assert!(outcome.new_variables.is_empty());
    }

    #[tokio::test]
    async fn test_parse_error_degrades_to_text() {
        let provider = math_provider();
        let vars = VariablesManager::shared();
        let evaluator = ScriptEvaluator::default();

        let outcome = evaluator.eval("not json at all", &provider, &vars).await.unwrap();
        assert!(outcome.output.starts_with("Error during execution:"));
        assert!(outcome.new_variables.is_empty());
    }

    #[tokio::test]
    async fn test_tool_failure_stops_script() {
        let provider = math_provider();
        let vars = VariablesManager::shared();
        let evaluator = ScriptEvaluator::default();

        let code = r#"[
            {"op": "CALL", "tool": "fail"},
            {"op": "PRINT", "value": "unreachable"}
        ]"#;

        let outcome = evaluator.eval(code, &provider, &vars).await.unwrap();
        assert!(outcome.output.contains("Error during execution:"));
        assert!(outcome.output.contains("deliberate failure"));
        assert!(!outcome.output.contains("unreachable"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let provider = math_provider();
        let vars = VariablesManager::shared();
        let evaluator = ScriptEvaluator::new(1);

        let code = r#"[{"op": "CALL", "tool": "sleep"}]"#;
        let outcome = evaluator.eval(code, &provider, &vars).await.unwrap();
        assert!(outcome.output.contains("timed out after 1 seconds"));
    }

    #[tokio::test]
    async fn test_let_and_interpolation() {
        let provider = math_provider();
        let vars = VariablesManager::shared();
        let evaluator = ScriptEvaluator::default();

        let code = r#"[
            {"op": "LET", "name": "n", "value": 5},
            {"op": "CALL", "tool": "double", "args": {"n": "{n}"}, "store_to": "doubled"},
            {"op": "PRINT", "value": "doubled {n}: {doubled}"}
        ]"#;

        let outcome = evaluator.eval(code, &provider, &vars).await.unwrap();
        assert!(outcome.output.contains("doubled 5:"));
        assert_eq!(outcome.new_variables.len(), 2);
    }

    #[tokio::test]
    async fn test_reassigning_existing_is_not_new() {
        let provider = math_provider();
        let vars = VariablesManager::shared();
        vars.write().unwrap().add("seed", json!(1), "Provided by caller");
        let evaluator = ScriptEvaluator::default();

        let code = r#"[{"op": "LET", "name": "seed", "value": 2}]"#;
        let outcome = evaluator.eval(code, &provider, &vars).await.unwrap();
        assert!(outcome.new_variables.is_empty());
        assert_eq!(vars.read().unwrap().get("seed"), Some(&json!(2)));
    }
}
