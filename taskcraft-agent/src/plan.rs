//! Plan-review prompt rendering.
//!
//! Builds the user prompt a plan controller sees between subtasks: completed
//! subtask history, the variables summary, the current location, the intent,
//! and the task decomposition with progress markers.

use crate::state::SubTaskHistory;

/// Context for one plan-review prompt
#[derive(Debug, Clone, Default)]
pub struct ControllerContext {
    /// Completed subtasks, oldest first
    pub history: Vec<SubTaskHistory>,
    /// Rendered variables summary
    pub variables_history: String,
    /// Current URL or location
    pub url: String,
    /// The user's original intent
    pub intent: String,
    /// Planned subtasks, in order
    pub task_decomposition: Vec<String>,
    /// Progress marker per subtask (e.g. "completed", "in-progress")
    pub sub_tasks_progress: Vec<String>,
    pub current_datetime: String,
}

impl ControllerContext {
    /// Render the prompt.
    ///
    /// Subtasks are enumerated 1-based; steps render as bullets only when
    /// present; an absent or empty final answer renders as the literal
    /// "no answer is returned". Section headers always render.
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str("**Previous Subtasks**:\n");
        for (i, item) in self.history.iter().enumerate() {
            out.push_str(&format!("**Subtask {}**: {}\n", i + 1, item.sub_task));
            for step in &item.steps {
                out.push_str(&format!("- {}\n", step));
            }
            match &item.final_answer {
                Some(answer) if !answer.trim().is_empty() => {
                    out.push_str(&format!("**Final Answer**: {}\n", answer));
                }
                _ => {
                    out.push_str("**Final Answer**: no answer is returned\n");
                }
            }
            out.push('\n');
        }
        if self.history.is_empty() {
            out.push('\n');
        }

        out.push_str("**Variables History**:\n");
        out.push_str(&self.variables_history);
        out.push_str("\n\n");

        out.push_str(&format!("**Current URL**: {}\n\n", self.url));
        out.push_str(&format!("**Intent**: {}\n\n", self.intent));

        out.push_str("**Subtasks**:\n");
        for (i, task) in self.task_decomposition.iter().enumerate() {
            match self.sub_tasks_progress.get(i) {
                Some(progress) => out.push_str(&format!("{}. {} [{}]\n", i + 1, task, progress)),
                None => out.push_str(&format!("{}. {}\n", i + 1, task)),
            }
        }
        out.push('\n');

        out.push_str(&format!("Current datetime: {}\n", self.current_datetime));

        out
    }
}
