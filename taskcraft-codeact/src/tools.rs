//! # Tool Provider Interface
//!
//! Tools are supplied to the agent through a provider: either in-process
//! function bindings (`DirectToolsProvider`) or a remote registry
//! (`RegistryProvider`). A provider exposes the connected apps, the tool
//! definitions (with parameter and response schemas), and a call dispatch.

use crate::error::{self, Result};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;

/// A connected application surface (API, web app, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppDefinition {
    pub name: String,
    /// App type, e.g. "api" or "web"
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl AppDefinition {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            description: None,
            url: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Definition of a callable tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema describing the parameters object
    pub parameters: serde_json::Value,
    /// JSON shape of a successful response, rendered into the system prompt
    #[serde(default)]
    pub response_schema: Option<serde_json::Value>,
    /// Free-form constraint notes per parameter name
    #[serde(default)]
    pub param_constraints: HashMap<String, Vec<String>>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
            response_schema: None,
            param_constraints: HashMap::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_response_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_constraint(mut self, param: impl Into<String>, note: impl Into<String>) -> Self {
        self.param_constraints
            .entry(param.into())
            .or_default()
            .push(note.into());
        self
    }
}

/// The tool provider trait - where the agent gets its tools from
#[allow(async_fn_in_trait)]
pub trait ToolProvider: Send + Sync {
    /// Prepare the provider (fetch remote definitions, open connections, ...)
    async fn initialize(&self) -> Result<()>;

    /// Connected apps
    async fn apps(&self) -> Result<Vec<AppDefinition>>;

    /// All available tool definitions
    async fn tools(&self) -> Result<Vec<ToolSpec>>;

    /// Invoke a tool by name with JSON arguments
    fn call(
        &self,
        name: &str,
        args: serde_json::Value,
    ) -> impl std::future::Future<Output = Result<serde_json::Value>> + Send;
}

/// Handler for an in-process tool
pub type ToolHandler =
    Box<dyn Fn(serde_json::Value) -> BoxFuture<'static, Result<serde_json::Value>> + Send + Sync>;

/// Tool provider backed by in-process function bindings.
///
/// ```rust
/// use taskcraft_codeact::tools::{DirectToolsProvider, ToolSpec};
///
/// let mut provider = DirectToolsProvider::new();
/// provider.register(ToolSpec::new("echo", "Echo the arguments back"), |args| async move {
///     Ok(args)
/// });
/// ```
pub struct DirectToolsProvider {
    apps: Vec<AppDefinition>,
    specs: Vec<ToolSpec>,
    handlers: HashMap<String, ToolHandler>,
}

impl DirectToolsProvider {
    pub fn new() -> Self {
        Self {
            apps: Vec::new(),
            specs: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    /// Declare a connected app
    pub fn with_app(mut self, app: AppDefinition) -> Self {
        self.apps.push(app);
        self
    }

    /// Register a tool with its async handler.
    ///
    /// Re-registering a name replaces the previous handler.
    pub fn register<F, Fut>(&mut self, spec: ToolSpec, handler: F)
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value>> + Send + 'static,
    {
        let name = spec.name.clone();
        self.specs.retain(|s| s.name != name);
        self.specs.push(spec);
        self.handlers
            .insert(name, Box::new(move |args| Box::pin(handler(args))));
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl Default for DirectToolsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolProvider for DirectToolsProvider {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn apps(&self) -> Result<Vec<AppDefinition>> {
        Ok(self.apps.clone())
    }

    async fn tools(&self) -> Result<Vec<ToolSpec>> {
        Ok(self.specs.clone())
    }

    async fn call(&self, name: &str, args: serde_json::Value) -> Result<serde_json::Value> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| error::tool_not_found(name).with_operation("tools::call"))?;
        handler(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn sample_provider() -> DirectToolsProvider {
        let mut provider = DirectToolsProvider::new()
            .with_app(AppDefinition::new("math", "api").with_description("Arithmetic helpers"));

        let spec = ToolSpec::new("double", "Double a number")
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "n": { "type": "integer", "description": "Number to double" }
                },
                "required": ["n"]
            }))
            .with_response_schema(json!({ "value": "int" }));

        provider.register(spec, |args| async move {
            let n = args["n"].as_i64().unwrap_or(0);
            Ok(json!({ "value": n * 2 }))
        });

        provider
    }

    #[tokio::test]
    async fn test_direct_call() {
        let provider = sample_provider();
        provider.initialize().await.unwrap();

        let result = provider.call("double", json!({"n": 21})).await.unwrap();
        assert_eq!(result["value"], 42);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let provider = sample_provider();

        let err = provider.call("missing", json!({})).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ToolNotFound);
    }

    #[tokio::test]
    async fn test_apps_and_tools() {
        let provider = sample_provider();

        let apps = provider.apps().await.unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].name, "math");

        let tools = provider.tools().await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "double");
        assert!(tools[0].response_schema.is_some());
    }

    #[test]
    fn test_register_replaces() {
        let mut provider = DirectToolsProvider::new();
        provider.register(ToolSpec::new("echo", "v1"), |args| async move { Ok(args) });
        provider.register(ToolSpec::new("echo", "v2"), |args| async move { Ok(args) });

        assert_eq!(provider.len(), 1);
        assert_eq!(provider.specs[0].description, "v2");
    }

    #[test]
    fn test_app_serde_uses_type_field() {
        let app = AppDefinition::new("mail", "api").with_url("http://localhost:8080");
        let json = serde_json::to_value(&app).unwrap();
        assert_eq!(json["type"], "api");

        let back: AppDefinition = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind, "api");
    }
}
