//! Execution metrics - timing and token usage across one `execute` call

use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use taskcraft_codeact::provider::{Usage, UsageTracker};

/// Records timing and usage while the graph runs
#[derive(Debug)]
pub struct MetricsRecorder {
    start: Instant,
    last_end: Option<Instant>,
    llm_calls: usize,
    usage: UsageTracker,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            last_end: None,
            llm_calls: 0,
            usage: UsageTracker::new(),
        }
    }

    /// Reset all metrics and restart the clock
    pub fn reset(&mut self) {
        self.start = Instant::now();
        self.last_end = None;
        self.llm_calls = 0;
        self.usage.reset();
    }

    /// Record one completed model call
    pub fn on_llm_end(&mut self, model: &str, usage: &Usage) {
        self.llm_calls += 1;
        self.last_end = Some(Instant::now());
        self.usage.track(model, usage);
    }

    pub fn llm_calls(&self) -> usize {
        self.llm_calls
    }

    pub fn total_tokens(&self) -> usize {
        self.usage.total_tokens()
    }

    /// Seconds from start to the last model call (or now when none finished)
    pub fn duration_seconds(&self) -> f64 {
        let end = self.last_end.unwrap_or_else(Instant::now);
        let secs = end.duration_since(self.start).as_secs_f64();
        (secs * 100.0).round() / 100.0
    }

    /// Produce the final metrics record
    pub fn finalize(
        &self,
        step_count: usize,
        tools_available: usize,
        apps_used: Vec<String>,
        error: Option<String>,
    ) -> ExecutionMetrics {
        ExecutionMetrics {
            duration_seconds: self.duration_seconds(),
            llm_calls: self.llm_calls,
            total_tokens: self.usage.total_tokens(),
            usage_by_model: self.usage.by_model.clone(),
            step_count,
            tools_available,
            apps_used,
            error,
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Structured metrics returned with every execution outcome
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionMetrics {
    pub duration_seconds: f64,
    pub llm_calls: usize,
    pub total_tokens: usize,
    pub usage_by_model: HashMap<String, Usage>,
    pub step_count: usize,
    pub tools_available: usize,
    pub apps_used: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionMetrics {
    /// Short human-readable summary for progress output
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Duration: {}s", self.duration_seconds),
            format!("LLM Calls: {}", self.llm_calls),
            format!("Total Tokens: {}", self.total_tokens),
            format!("Steps: {}", self.step_count),
            format!("Tools Available: {}", self.tools_available),
        ];
        if let Some(error) = &self.error {
            lines.push(format!("Error: {}", error));
        }
        lines
    }
}
