//! # Action Scripts
//!
//! The model acts by emitting a fenced action script: a JSON array of
//! statements that call tools, bind variables, and print output. This module
//! extracts script text from model output and parses it into statements.

use crate::error::{self, Result};
use crate::variables::VariablesManager;
use serde::{Deserialize, Serialize};

/// Extract code from markdown fences in message content.
///
/// A leading language-tag line (a bare word like `json`) is stripped from
/// each block; multiple blocks are joined with blank lines. Returns an empty
/// string when the content has no closed fence.
pub fn extract_code_blocks(content: &str) -> String {
    let parts: Vec<&str> = content.split("```").collect();
    let mut blocks = Vec::new();

    for (i, part) in parts.iter().enumerate() {
        // Odd indices are fence interiors; the last part is unclosed
        if i % 2 != 1 || i == parts.len() - 1 {
            continue;
        }

        let block = part.trim();
        if block.is_empty() {
            continue;
        }

        let mut lines = block.lines();
        let first = lines.next().unwrap_or("").trim();
        let looks_like_tag =
            first.is_empty() || first.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

        let body = if looks_like_tag {
            lines.collect::<Vec<_>>().join("\n")
        } else {
            block.to_string()
        };

        if !body.trim().is_empty() {
            blocks.push(body.trim().to_string());
        }
    }

    blocks.join("\n\n")
}

fn empty_args() -> serde_json::Value {
    serde_json::json!({})
}

/// A single action-script statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Statement {
    /// Invoke a tool, optionally binding the result to a variable
    Call {
        tool: String,
        #[serde(default = "empty_args")]
        args: serde_json::Value,
        #[serde(default)]
        store_to: Option<String>,
    },

    /// Bind a literal value to a variable
    Let {
        name: String,
        value: serde_json::Value,
    },

    /// Append a value to the execution output.
    /// String values interpolate `{variable}` references.
    Print { value: serde_json::Value },
}

/// A parsed action script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionScript {
    pub statements: Vec<Statement>,
}

impl ActionScript {
    /// Parse a script from raw JSON or fenced content
    pub fn parse(content: &str) -> Result<Self> {
        let json_str = if content.contains("```json") {
            content
                .split("```json")
                .nth(1)
                .and_then(|s| s.split("```").next())
                .map(|s| s.trim())
                .unwrap_or(content)
        } else if content.contains("```") {
            content
                .split("```")
                .nth(1)
                .map(|s| s.trim())
                .unwrap_or(content)
        } else {
            content.trim()
        };

        let statements = serde_json::from_str::<Vec<Statement>>(json_str).map_err(|e| {
            error::parse_error(format!(
                "Failed to parse action script: {}\n\nContent:\n{}",
                e, json_str
            ))
            .with_operation("script::parse")
        })?;

        Ok(Self { statements })
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Resolve `{variable}` references inside a statement value.
///
/// A string that is exactly `"{name}"` becomes the variable's value; other
/// strings get each `{name}` occurrence replaced with the rendered value.
/// Arrays and objects are resolved recursively.
pub fn resolve_refs(value: &serde_json::Value, vars: &VariablesManager) -> serde_json::Value {
    match value {
        serde_json::Value::String(s) => {
            if let Some(name) = whole_ref(s) {
                if let Some(v) = vars.get(name) {
                    return v.clone();
                }
            }

            let mut out = s.clone();
            for name in vars.names_in_order() {
                let marker = format!("{{{}}}", name);
                if out.contains(&marker) {
                    let rendered = match vars.get(&name) {
                        Some(serde_json::Value::String(s)) => s.clone(),
                        Some(other) => other.to_string(),
                        None => continue,
                    };
                    out = out.replace(&marker, &rendered);
                }
            }
            serde_json::Value::String(out)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(|v| resolve_refs(v, vars)).collect())
        }
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), resolve_refs(v, vars)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Check for a string of exactly the form `{identifier}`
fn whole_ref(s: &str) -> Option<&str> {
    let inner = s.strip_prefix('{')?.strip_suffix('}')?;
    if !inner.is_empty()
        && inner
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Some(inner)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_extract_tagged_block() {
        let content = "Here is the plan:\n```json\n[{\"op\": \"PRINT\", \"value\": \"hi\"}]\n```\nDone.";
        let code = extract_code_blocks(content);
        assert_eq!(code, "[{\"op\": \"PRINT\", \"value\": \"hi\"}]");
    }

    #[test]
    fn test_extract_untagged_block() {
        let content = "```\n[1, 2, 3]\n```";
        assert_eq!(extract_code_blocks(content), "[1, 2, 3]");
    }

    #[test]
    fn test_extract_multiple_blocks() {
        let content = "```json\n[1]\n```\ntext\n```json\n[2]\n```";
        assert_eq!(extract_code_blocks(content), "[1]\n\n[2]");
    }

    #[test]
    fn test_extract_no_fences() {
        assert_eq!(extract_code_blocks("plain answer, no code"), "");
    }

    #[test]
    fn test_extract_unclosed_fence() {
        assert_eq!(extract_code_blocks("```json\n[1, 2"), "");
    }

    #[test]
    fn test_parse_raw_array() {
        let script = ActionScript::parse(
            r#"[
                {"op": "CALL", "tool": "list_emails", "args": {"query": "weekly"}, "store_to": "found"},
                {"op": "PRINT", "value": "{found}"}
            ]"#,
        )
        .unwrap();

        assert_eq!(script.len(), 2);
        match &script.statements[0] {
            Statement::Call { tool, store_to, .. } => {
                assert_eq!(tool, "list_emails");
                assert_eq!(store_to.as_deref(), Some("found"));
            }
            other => panic!("expected CALL, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_fenced() {
        let script = ActionScript::parse("```json\n[{\"op\": \"LET\", \"name\": \"x\", \"value\": 1}]\n```")
            .unwrap();
        assert_eq!(script.statements[0], Statement::Let { name: "x".into(), value: json!(1) });
    }

    #[test]
    fn test_parse_defaults() {
        let script = ActionScript::parse(r#"[{"op": "CALL", "tool": "ping"}]"#).unwrap();
        match &script.statements[0] {
            Statement::Call { args, store_to, .. } => {
                assert_eq!(args, &json!({}));
                assert!(store_to.is_none());
            }
            other => panic!("expected CALL, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_failure() {
        let err = ActionScript::parse("[{\"op\": \"NOPE\"}]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseFailed);
    }

    #[test]
    fn test_resolve_whole_ref() {
        let mut vars = VariablesManager::new();
        vars.add("emails", json!(["a@x.com", "b@x.com"]), "");

        let resolved = resolve_refs(&json!("{emails}"), &vars);
        assert_eq!(resolved, json!(["a@x.com", "b@x.com"]));
    }

    #[test]
    fn test_resolve_embedded_ref() {
        let mut vars = VariablesManager::new();
        vars.add("city", json!("London"), "");
        vars.add("temp", json!(15), "");

        let resolved = resolve_refs(&json!("Weather in {city}: {temp}C"), &vars);
        assert_eq!(resolved, json!("Weather in London: 15C"));
    }

    #[test]
    fn test_resolve_unknown_ref_left_alone() {
        let vars = VariablesManager::new();
        let resolved = resolve_refs(&json!("{missing}"), &vars);
        assert_eq!(resolved, json!("{missing}"));
    }

    #[test]
    fn test_resolve_nested() {
        let mut vars = VariablesManager::new();
        vars.add("to", json!("ops@example.com"), "");

        let resolved = resolve_refs(
            &json!({"to_address": "{to}", "nested": ["{to}", 1]}),
            &vars,
        );
        assert_eq!(resolved["to_address"], json!("ops@example.com"));
        assert_eq!(resolved["nested"][0], json!("ops@example.com"));
    }
}
