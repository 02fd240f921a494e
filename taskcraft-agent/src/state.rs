//! State records produced by an execution: subtask history for follow-up
//! prompts, the per-turn output record, and structured state messages.

use crate::metrics::ExecutionMetrics;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use taskcraft_codeact::eval::NEW_VARIABLES_HEADER;

/// Record of one completed unit of work, consumed by prompt rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTaskHistory {
    pub sub_task: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub final_answer: Option<String>,
}

impl SubTaskHistory {
    pub fn new(sub_task: impl Into<String>) -> Self {
        Self {
            sub_task: sub_task.into(),
            steps: Vec::new(),
            final_answer: None,
        }
    }

    pub fn with_steps(mut self, steps: Vec<String>) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_final_answer(mut self, answer: impl Into<String>) -> Self {
        self.final_answer = Some(answer.into());
        self
    }
}

/// The terminal record of one execution, serialized into the state log
#[derive(Debug, Clone, Serialize)]
pub struct CodeActOutput {
    /// All generated scripts, joined
    pub code: String,
    /// All execution outputs, joined
    pub execution_output: String,
    /// One line per code-generation step
    pub steps_summary: Vec<String>,
    pub summary: String,
    pub metrics: ExecutionMetrics,
    pub final_answer: String,
}

/// A structured message appended to the caller's state log
#[derive(Debug, Clone)]
pub struct StateMessage {
    /// JSON payload of the message
    pub content: serde_json::Value,
    /// Variables context carried to the next turn (terminal records only)
    pub context: Option<HashMap<String, serde_json::Value>>,
}

impl StateMessage {
    /// Record one script execution and its output
    pub fn execution_record(step: usize, code: &str, execution_output: &str) -> Self {
        Self {
            content: serde_json::json!({
                "status": "execution_output",
                "step": step,
                "code": code,
                "execution_output": execution_output,
                "message": format!("Code execution and output for step {}", step),
            }),
            context: None,
        }
    }

    /// Terminal record carrying the turn output and the retained variables
    pub fn turn_record(
        output: &CodeActOutput,
        context: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            content: serde_json::to_value(output).unwrap_or_default(),
            context: Some(context),
        }
    }
}

/// Strip the new-variables appendix from an execution output
pub fn strip_new_variables_suffix(output: &str) -> &str {
    match output.split(NEW_VARIABLES_HEADER).next() {
        Some(head) => head.trim_end(),
        None => output,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtask_history_serde() {
        let history = SubTaskHistory::new("Read emails from contacts.txt")
            .with_steps(vec!["Opened file".into(), "Extracted 7 emails".into()])
            .with_final_answer("Successfully read 7 email addresses");

        let json = serde_json::to_value(&history).unwrap();
        assert_eq!(json["sub_task"], "Read emails from contacts.txt");
        assert_eq!(json["steps"].as_array().unwrap().len(), 2);

        let back: SubTaskHistory = serde_json::from_value(json).unwrap();
        assert_eq!(back, history);
    }

    #[test]
    fn test_subtask_history_defaults() {
        let parsed: SubTaskHistory =
            serde_json::from_str(r#"{"sub_task": "Search products"}"#).unwrap();
        assert!(parsed.steps.is_empty());
        assert!(parsed.final_answer.is_none());
    }

    #[test]
    fn test_execution_record_shape() {
        let record = StateMessage::execution_record(3, "[{\"op\": \"PRINT\"}]", "hello");
        assert_eq!(record.content["status"], "execution_output");
        assert_eq!(record.content["step"], 3);
        assert_eq!(record.content["execution_output"], "hello");
        assert!(record.context.is_none());
    }

    #[test]
    fn test_strip_new_variables_suffix() {
        let output = format!("result line\n\n{}\n## x\n- Type: int", NEW_VARIABLES_HEADER);
        assert_eq!(strip_new_variables_suffix(&output), "result line");

        assert_eq!(strip_new_variables_suffix("plain output"), "plain output");
    }
}
