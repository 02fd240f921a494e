//! Demo email tools
//!
//! Binds the mailbox as three agent tools. Failures at the tool boundary
//! are structured results (`ok` flag plus an error code/message), not Rust
//! errors - the model reads them from the execution output.

use crate::store::MailStore;
use serde_json::{json, Value};
use std::sync::Arc;
use taskcraft_codeact::tools::{AppDefinition, DirectToolsProvider, ToolSpec};

/// Fixed sender for the demo relay
const DEMO_SENDER: &str = "test@mail.com";

/// Listing size used by the `list_emails` tool
const TOOL_LIST_LIMIT: usize = 10;

fn error_result(code: &str, message: impl Into<String>) -> Value {
    json!({
        "ok": false,
        "error": { "code": code, "message": message.into() }
    })
}

fn require_str(args: &Value, key: &str) -> Result<String, Value> {
    match args.get(key).and_then(|v| v.as_str()) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(error_result(
            "INVALID_PARAMS",
            format!("missing required string parameter '{}'", key),
        )),
    }
}

/// Build the demo email tool provider over a shared mailbox
pub fn demo_tools(store: Arc<MailStore>) -> DirectToolsProvider {
    let mut provider = DirectToolsProvider::new().with_app(
        AppDefinition::new("local_email", "api")
            .with_description("Local demo mailbox: send, list, and read captured emails"),
    );

    let send_store = store.clone();
    provider.register(
        ToolSpec::new(
            "send_email",
            "Send an email via the local relay. The message is captured into the demo mailbox.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "to_address": { "type": "string", "description": "Recipient address" },
                "subject": { "type": "string", "description": "Subject line" },
                "body": { "type": "string", "description": "Plaintext body" }
            },
            "required": ["to_address", "subject", "body"]
        }))
        .with_response_schema(json!({ "ok": "bool", "message_id": "str" }))
        .with_constraint("to_address", "must be a single email address"),
        move |args| {
            let store = send_store.clone();
            async move {
                let to_address = match require_str(&args, "to_address") {
                    Ok(v) => v,
                    Err(e) => return Ok(e),
                };
                let subject = match require_str(&args, "subject") {
                    Ok(v) => v,
                    Err(e) => return Ok(e),
                };
                let body = match require_str(&args, "body") {
                    Ok(v) => v,
                    Err(e) => return Ok(e),
                };

                match store.deliver(DEMO_SENDER, vec![to_address], subject, body) {
                    Ok(message) => Ok(json!({ "ok": true, "message_id": message.id })),
                    Err(e) => Ok(error_result("RELAY_ERROR", e.to_string())),
                }
            }
        },
    );

    let list_store = store.clone();
    provider.register(
        ToolSpec::new(
            "list_emails",
            "List captured emails, newest first. The query is an optional case-insensitive \
             substring match over subject, from, recipients, and the plaintext body; no regex \
             or wildcards, and an empty query returns everything.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Substring to search for", "default": "" }
            },
            "required": []
        }))
        .with_response_schema(json!({
            "ok": "bool",
            "result": [{ "id": "str", "subject": "str", "from": "str", "to": "list", "date": "int" }]
        })),
        move |args| {
            let store = list_store.clone();
            async move {
                let query = args.get("query").and_then(|v| v.as_str()).unwrap_or("");

                match store.list(Some(query), TOOL_LIST_LIMIT) {
                    Ok(messages) => {
                        let items: Vec<Value> = messages
                            .iter()
                            .map(|m| {
                                json!({
                                    "id": m.id,
                                    "subject": m.subject,
                                    "from": m.from_addr,
                                    "to": m.to,
                                    "date": m.date,
                                })
                            })
                            .collect();
                        Ok(json!({ "ok": true, "result": items }))
                    }
                    Err(e) => Ok(error_result("MAILBOX_ERROR", e.to_string())),
                }
            }
        },
    );

    let read_store = store;
    provider.register(
        ToolSpec::new(
            "read_email",
            "Fetch the full record for a specific email id.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "id": { "type": "string", "description": "Message id from list_emails" }
            },
            "required": ["id"]
        }))
        .with_response_schema(json!({ "ok": "bool", "result": "dict" })),
        move |args| {
            let store = read_store.clone();
            async move {
                let id = match require_str(&args, "id") {
                    Ok(v) => v,
                    Err(e) => return Ok(e),
                };

                match store.get(&id) {
                    Ok(message) => Ok(json!({
                        "ok": true,
                        "result": serde_json::to_value(&message).unwrap_or_default()
                    })),
                    Err(e) => Ok(error_result("NOT_FOUND", e.to_string())),
                }
            }
        },
    );

    provider
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskcraft_codeact::tools::ToolProvider;
    use tempfile::TempDir;

    async fn provider() -> (TempDir, DirectToolsProvider) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MailStore::new(dir.path()).unwrap());
        (dir, demo_tools(store))
    }

    #[tokio::test]
    async fn test_send_then_list_then_read() {
        let (_dir, tools) = provider().await;

        let sent = tools
            .call(
                "send_email",
                json!({
                    "to_address": "ops@example.com",
                    "subject": "Weekly Report",
                    "body": "All systems nominal."
                }),
            )
            .await
            .unwrap();
        assert_eq!(sent["ok"], true);
        let message_id = sent["message_id"].as_str().unwrap().to_string();

        let listed = tools
            .call("list_emails", json!({ "query": "weekly" }))
            .await
            .unwrap();
        assert_eq!(listed["ok"], true);
        let items = listed["result"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], message_id.as_str());
        assert_eq!(items[0]["from"], DEMO_SENDER);

        let read = tools
            .call("read_email", json!({ "id": message_id }))
            .await
            .unwrap();
        assert_eq!(read["ok"], true);
        assert_eq!(read["result"]["text"], "All systems nominal.");
    }

    #[tokio::test]
    async fn test_send_missing_params() {
        let (_dir, tools) = provider().await;

        let result = tools
            .call("send_email", json!({ "subject": "no recipient" }))
            .await
            .unwrap();
        assert_eq!(result["ok"], false);
        assert_eq!(result["error"]["code"], "INVALID_PARAMS");
        assert!(result["error"]["message"]
            .as_str()
            .unwrap()
            .contains("to_address"));
    }

    #[tokio::test]
    async fn test_read_unknown_id() {
        let (_dir, tools) = provider().await;

        let result = tools
            .call("read_email", json!({ "id": "msg_missing" }))
            .await
            .unwrap();
        assert_eq!(result["ok"], false);
        assert_eq!(result["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_list_empty_query_returns_all() {
        let (_dir, tools) = provider().await;

        for i in 0..3 {
            tools
                .call(
                    "send_email",
                    json!({
                        "to_address": format!("user{}@example.com", i),
                        "subject": format!("Message {}", i),
                        "body": "content"
                    }),
                )
                .await
                .unwrap();
        }

        let listed = tools.call("list_emails", json!({})).await.unwrap();
        assert_eq!(listed["result"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_specs_for_prompt_rendering() {
        let (_dir, tools) = provider().await;

        let specs = tools.tools().await.unwrap();
        assert_eq!(specs.len(), 3);
        let send = specs.iter().find(|s| s.name == "send_email").unwrap();
        assert!(send.response_schema.is_some());
        assert!(send.param_constraints.contains_key("to_address"));

        let apps = tools.apps().await.unwrap();
        assert_eq!(apps[0].name, "local_email");
    }
}
