//! # System Prompt Assembly
//!
//! Renders the CodeAct system prompt from the tool provider's definitions:
//! per-tool signatures and parameter docs derived from JSON schemas, the
//! connected apps, the action-script format contract, and the cases in which
//! the model should return to the user instead of acting.

use crate::tools::{AppDefinition, ToolSpec};

/// Builds the system prompt for a set of tools and apps
pub struct PromptBuilder<'a> {
    tools: &'a [ToolSpec],
    apps: &'a [AppDefinition],
    allow_user_clarification: bool,
    return_to_user_cases: Option<&'a [String]>,
    instructions: Option<&'a str>,
    task_loaded_from_file: bool,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(tools: &'a [ToolSpec], apps: &'a [AppDefinition]) -> Self {
        Self {
            tools,
            apps,
            allow_user_clarification: true,
            return_to_user_cases: None,
            instructions: None,
            task_loaded_from_file: false,
        }
    }

    /// Allow the model to ask the user for clarification (default: true)
    pub fn allow_user_clarification(mut self, allow: bool) -> Self {
        self.allow_user_clarification = allow;
        self
    }

    /// Replace the default return-to-user cases
    pub fn with_return_cases(mut self, cases: &'a [String]) -> Self {
        self.return_to_user_cases = Some(cases);
        self
    }

    /// Add a special-instructions section
    pub fn with_instructions(mut self, instructions: &'a str) -> Self {
        self.instructions = Some(instructions);
        self
    }

    /// Note that the task text was loaded from a file
    pub fn task_loaded_from_file(mut self, loaded: bool) -> Self {
        self.task_loaded_from_file = loaded;
        self
    }

    /// Render the system prompt
    pub fn build(&self) -> String {
        let mut out = String::new();

        out.push_str("# Task Execution Agent\n\n");
        out.push_str(
            "You solve tasks by calling tools through action scripts. In each reply, \
             either emit exactly one fenced ```json action script to act, or reply in \
             plain text to deliver your final answer.\n\n",
        );

        if !self.apps.is_empty() {
            out.push_str("## Connected Apps\n\n");
            for app in self.apps {
                out.push_str(&format!(
                    "- **{}** ({}): {}\n",
                    app.name,
                    app.kind,
                    app.description.as_deref().unwrap_or("No description available")
                ));
            }
            out.push('\n');
        }

        out.push_str("## Available Tools\n\n");
        for tool in self.tools {
            out.push_str(&render_tool(tool));
            out.push('\n');
        }

        out.push_str("## Action Script Format\n\n");
        out.push_str("An action script is a JSON array of statements (use EXACT field names):\n\n");
        out.push_str(
            "- CALL: {\"op\": \"CALL\", \"tool\": \"<name>\", \"args\": {...}, \"store_to\": \"<variable>\"}\n",
        );
        out.push_str("- LET: {\"op\": \"LET\", \"name\": \"<variable>\", \"value\": <json>}\n");
        out.push_str("- PRINT: {\"op\": \"PRINT\", \"value\": \"text or {variable}\"}\n\n");
        out.push_str(
            "String values interpolate {variable} references. Results stored with \
             store_to become variables available in later scripts and turns.\n\n",
        );
        out.push_str("Example:\n```json\n[\n");
        out.push_str(
            "  {\"op\": \"CALL\", \"tool\": \"some_tool\", \"args\": {\"key\": \"value\"}, \"store_to\": \"result\"},\n",
        );
        out.push_str("  {\"op\": \"PRINT\", \"value\": \"{result}\"}\n]\n```\n\n");

        out.push_str("## When to Return to the User\n\n");
        out.push_str("Reply in plain text (no script) only when:\n");
        match self.return_to_user_cases {
            Some(cases) => {
                for (i, case) in cases.iter().enumerate() {
                    out.push_str(&format!("{}. {}\n", i + 1, case));
                }
            }
            None => {
                out.push_str(
                    "1. You have a complete final answer with all necessary data from script execution\n",
                );
                if self.allow_user_clarification {
                    out.push_str("2. You need missing parameters or clarification from the user\n");
                }
            }
        }
        out.push('\n');

        if let Some(instructions) = self.instructions {
            out.push_str("## Special Instructions\n\n");
            out.push_str(instructions);
            out.push_str("\n\n");
        }

        if self.task_loaded_from_file {
            out.push_str(
                "Note: the task was loaded from a file; treat its contents as the complete task description.\n",
            );
        }

        out
    }
}

fn render_tool(tool: &ToolSpec) -> String {
    let mut out = String::new();

    let (params_str, params_doc) = render_params(tool);
    out.push_str(&format!("### {}({})\n", tool.name, params_str));
    out.push_str(&format!("{}\n\n", tool.description));
    out.push_str("Parameters:\n");
    out.push_str(&params_doc);
    out.push('\n');

    if let Some(schema) = &tool.response_schema {
        let rendered = serde_json::to_string_pretty(schema).unwrap_or_default();
        out.push_str(&format!(
            "\nReturns (on success) - Response Schema:\n{}\n",
            rendered
        ));
    }

    out
}

/// Build the signature string and the parameter bullet list for a tool
fn render_params(tool: &ToolSpec) -> (String, String) {
    let properties = match tool.parameters.get("properties").and_then(|p| p.as_object()) {
        Some(props) => props,
        None => return ("**kwargs".to_string(), "No parameters required\n".to_string()),
    };

    if properties.is_empty() {
        return (String::new(), "No parameters required\n".to_string());
    }

    let required: Vec<&str> = tool
        .parameters
        .get("required")
        .and_then(|r| r.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    let mut params = Vec::new();
    let mut bullets = String::new();

    for (name, prop) in properties {
        let schema_type = prop.get("type").and_then(|t| t.as_str()).unwrap_or("Any");
        let script_type = map_schema_type(schema_type);
        let is_required = required.contains(&name.as_str());

        if is_required {
            params.push(format!("{}: {}", name, script_type));
        } else {
            match prop.get("default") {
                Some(serde_json::Value::String(s)) => {
                    params.push(format!("{}: {} = \"{}\"", name, script_type, s))
                }
                Some(other) if !other.is_null() => {
                    params.push(format!("{}: {} = {}", name, script_type, other))
                }
                _ => params.push(format!("{}: {} = None", name, script_type)),
            }
        }

        let description = prop.get("description").and_then(|d| d.as_str()).unwrap_or("");
        let mark = if is_required { " (required)" } else { " (optional)" };

        let mut constraints: Vec<String> = tool
            .param_constraints
            .get(name)
            .cloned()
            .unwrap_or_default();
        if constraints.is_empty() {
            if let Some(arr) = prop.get("constraints").and_then(|c| c.as_array()) {
                constraints = arr.iter().filter_map(|v| v.as_str().map(String::from)).collect();
            }
        }
        let constraints_str = if constraints.is_empty() {
            String::new()
        } else {
            format!(" [Constraints: {}]", constraints.join(", "))
        };

        bullets.push_str(&format!(
            "- `{}`: {}{} - {}{}\n",
            name, script_type, mark, description, constraints_str
        ));
    }

    (params.join(", "), bullets)
}

fn map_schema_type(schema_type: &str) -> &str {
    match schema_type {
        "string" => "str",
        "integer" => "int",
        "number" => "float",
        "boolean" => "bool",
        "array" => "list",
        "object" => "dict",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn send_email_spec() -> ToolSpec {
        ToolSpec::new("send_email", "Send an email via the local relay")
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "to_address": { "type": "string", "description": "Recipient address" },
                    "subject": { "type": "string", "description": "Subject line" },
                    "body": { "type": "string", "description": "Plaintext body" },
                    "priority": { "type": "integer", "description": "Delivery priority", "default": 3 }
                },
                "required": ["to_address", "subject", "body"]
            }))
            .with_response_schema(json!({ "ok": "bool", "message_id": "str" }))
            .with_constraint("to_address", "must be a valid email address")
    }

    #[test]
    fn test_tool_rendering() {
        let tools = vec![send_email_spec()];
        let apps = vec![];
        let prompt = PromptBuilder::new(&tools, &apps).build();

        assert!(prompt.contains("### send_email("));
        assert!(prompt.contains("to_address: str"));
        assert!(prompt.contains("priority: int = 3"));
        assert!(prompt.contains("- `to_address`: str (required) - Recipient address [Constraints: must be a valid email address]"));
        assert!(prompt.contains("- `priority`: int (optional) - Delivery priority"));
        assert!(prompt.contains("Returns (on success) - Response Schema:"));
        assert!(prompt.contains("\"message_id\""));
    }

    #[test]
    fn test_apps_section() {
        let tools = vec![send_email_spec()];
        let apps = vec![
            AppDefinition::new("local_email", "api").with_description("Demo mailbox"),
            AppDefinition::new("shop", "web"),
        ];
        let prompt = PromptBuilder::new(&tools, &apps).build();

        assert!(prompt.contains("## Connected Apps"));
        assert!(prompt.contains("- **local_email** (api): Demo mailbox"));
        assert!(prompt.contains("- **shop** (web): No description available"));
    }

    #[test]
    fn test_default_return_cases() {
        let tools = vec![send_email_spec()];
        let prompt = PromptBuilder::new(&tools, &[]).build();

        assert!(prompt.contains("1. You have a complete final answer"));
        assert!(prompt.contains("2. You need missing parameters or clarification from the user"));
    }

    #[test]
    fn test_clarification_disabled() {
        let tools = vec![send_email_spec()];
        let prompt = PromptBuilder::new(&tools, &[])
            .allow_user_clarification(false)
            .build();

        assert!(prompt.contains("1. You have a complete final answer"));
        assert!(!prompt.contains("clarification from the user"));
    }

    #[test]
    fn test_override_return_cases() {
        let tools = vec![send_email_spec()];
        let cases = vec![
            "You need user approval before executing a destructive action".to_string(),
        ];
        let prompt = PromptBuilder::new(&tools, &[]).with_return_cases(&cases).build();

        assert!(prompt.contains("1. You need user approval before executing a destructive action"));
        assert!(!prompt.contains("complete final answer"));
    }

    #[test]
    fn test_instructions_and_file_note() {
        let tools = vec![send_email_spec()];
        let prompt = PromptBuilder::new(&tools, &[])
            .with_instructions("Always reply in French.")
            .task_loaded_from_file(true)
            .build();

        assert!(prompt.contains("## Special Instructions"));
        assert!(prompt.contains("Always reply in French."));
        assert!(prompt.contains("the task was loaded from a file"));
    }

    #[test]
    fn test_schemaless_tool_renders_kwargs() {
        let tool = ToolSpec {
            name: "raw".into(),
            description: "No schema".into(),
            parameters: json!(null),
            response_schema: None,
            param_constraints: Default::default(),
        };
        let tools = vec![tool];
        let prompt = PromptBuilder::new(&tools, &[]).build();

        assert!(prompt.contains("### raw(**kwargs)"));
        assert!(prompt.contains("No parameters required"));
    }

    #[test]
    fn test_empty_properties() {
        let tool = ToolSpec::new("ping", "Liveness probe");
        let tools = vec![tool];
        let prompt = PromptBuilder::new(&tools, &[]).build();

        assert!(prompt.contains("### ping()"));
        assert!(prompt.contains("No parameters required"));
    }

    #[test]
    fn test_script_format_always_present() {
        let prompt = PromptBuilder::new(&[], &[]).build();
        assert!(prompt.contains("## Action Script Format"));
        assert!(prompt.contains("\"op\": \"CALL\""));
        assert!(prompt.contains("## When to Return to the User"));
    }
}
