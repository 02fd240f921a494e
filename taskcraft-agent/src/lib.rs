//! # taskcraft Agent
//!
//! The agent drives the CodeAct loop:
//! 1. User provides a task description
//! 2. The system prompt is assembled from the tool provider's definitions
//! 3. The graph streams state snapshots: model reply, extracted script,
//!    execution output
//! 4. The agent accumulates code and output, picks the final answer, and
//!    trims the variables context for the next turn
//! 5. Errors degrade to an error string plus partial metrics
//!
//! The model is the brain, the tools are the hands.

mod agent;
mod metrics;
pub mod plan;
mod state;

pub use agent::{AgentConfig, ExecuteOptions, ExecuteOutcome, TaskAgent};
pub use metrics::{ExecutionMetrics, MetricsRecorder};
pub use plan::ControllerContext;
pub use state::{CodeActOutput, StateMessage, SubTaskHistory};
