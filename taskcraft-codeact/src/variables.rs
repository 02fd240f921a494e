//! # Variables Manager
//!
//! Registry of named values produced during script execution. Variables are
//! summarized for inclusion in subsequent prompts and carried across turns
//! under a bounded retention policy: caller-supplied initial variables are
//! kept unconditionally, newly created variables keep only the most recent N.
//!
//! The registry is shared between the graph, the evaluator, and the agent
//! through a `VariablesHandle`.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Shared handle to the variables registry
pub type VariablesHandle = Arc<RwLock<VariablesManager>>;

/// Maximum characters of a value rendered into a summary
const PREVIEW_WIDTH: usize = 120;

/// A single stored variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableEntry {
    pub name: String,
    pub value: serde_json::Value,
    pub description: String,
}

/// Registry of named values with insertion-ordered retention
#[derive(Debug, Default)]
pub struct VariablesManager {
    entries: HashMap<String, VariableEntry>,
    /// Insertion order; re-adding a name moves it to the back
    order: Vec<String>,
}

impl VariablesManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry behind a shared handle
    pub fn shared() -> VariablesHandle {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Add or replace a variable. Re-adding refreshes its retention order.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        value: serde_json::Value,
        description: impl Into<String>,
    ) {
        let name = name.into();
        self.order.retain(|n| n != &name);
        self.order.push(name.clone());
        self.entries.insert(
            name.clone(),
            VariableEntry {
                name,
                value,
                description: description.into(),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.entries.get(name).map(|e| &e.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Remove a variable, reporting whether it existed
    pub fn remove(&mut self, name: &str) -> bool {
        self.order.retain(|n| n != name);
        self.entries.remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Variable names in insertion order
    pub fn names_in_order(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Current name -> value map
    pub fn snapshot(&self) -> HashMap<String, serde_json::Value> {
        self.entries
            .iter()
            .map(|(k, e)| (k.clone(), e.value.clone()))
            .collect()
    }

    /// Human-readable summary of the named variables (all when `names` is None)
    pub fn summary(&self, names: Option<&[String]>) -> String {
        let selected: Vec<&VariableEntry> = match names {
            Some(names) => names.iter().filter_map(|n| self.entries.get(n)).collect(),
            None => self
                .order
                .iter()
                .filter_map(|n| self.entries.get(n))
                .collect(),
        };

        if selected.is_empty() {
            return "# No variables stored".to_string();
        }

        let mut blocks = Vec::with_capacity(selected.len());
        for entry in selected {
            let mut block = String::new();
            block.push_str(&format!("## {}\n", entry.name));
            block.push_str(&format!("- Type: {}\n", type_name(&entry.value)));
            match &entry.value {
                serde_json::Value::Array(items) => {
                    block.push_str(&format!("- Items: {}\n", items.len()));
                }
                serde_json::Value::Object(map) => {
                    block.push_str(&format!("- Keys: {}\n", map.len()));
                }
                _ => {}
            }
            block.push_str(&format!("- Description: {}\n", entry.description));
            block.push_str(&format!("- Value: {}", preview(&entry.value)));
            blocks.push(block);
        }

        blocks.join("\n\n")
    }

    /// Apply the retention policy after a turn.
    ///
    /// Variables named in `initial` are kept unconditionally. Of the rest
    /// (in insertion order) only the last `keep_last_n` survive; evicted
    /// names are removed from the registry and returned. `keep_last_n == 0`
    /// disables trimming.
    pub fn trim_new_vars(&mut self, initial: &HashSet<String>, keep_last_n: usize) -> Vec<String> {
        if keep_last_n == 0 {
            return Vec::new();
        }

        let new_names: Vec<String> = self
            .order
            .iter()
            .filter(|n| !initial.contains(*n))
            .cloned()
            .collect();

        if new_names.len() <= keep_last_n {
            return Vec::new();
        }

        let evict = new_names.len() - keep_last_n;
        let removed: Vec<String> = new_names[..evict].to_vec();
        for name in &removed {
            self.remove(name);
        }
        removed
    }
}

/// Script-level type name of a JSON value
pub fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "int"
            } else {
                "float"
            }
        }
        serde_json::Value::String(_) => "str",
        serde_json::Value::Array(_) => "list",
        serde_json::Value::Object(_) => "dict",
    }
}

fn preview(value: &serde_json::Value) -> String {
    let rendered = match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    if rendered.chars().count() > PREVIEW_WIDTH {
        let clipped: String = rendered.chars().take(PREVIEW_WIDTH).collect();
        format!("{}...", clipped)
    } else {
        rendered
    }
}
