//! Tool registry provider - connects to a local tool registry service
//!
//! The registry is a separate process that owns the actual tool transport
//! (MCP servers, HTTP APIs) and exposes a small JSON interface:
//!
//! - `GET  {base}/apps`  -> `[AppDefinition]`
//! - `GET  {base}/tools` -> `[ToolSpec]`
//! - `POST {base}/call`  -> result of `{ "name": ..., "args": ... }`
//!
//! Default endpoint: http://localhost:8001

use crate::error::{self, Result};
use crate::tools::{AppDefinition, ToolProvider, ToolSpec};
use reqwest::Client;
use serde::Serialize;
use std::sync::RwLock;

/// Tool provider backed by a remote registry service
pub struct RegistryProvider {
    client: Client,
    base_url: String,
    /// Filter: only expose tools from these apps (empty = all)
    app_names: Vec<String>,
    apps: RwLock<Vec<AppDefinition>>,
    specs: RwLock<Vec<ToolSpec>>,
}

#[derive(Serialize)]
struct CallRequest<'a> {
    name: &'a str,
    args: serde_json::Value,
}

impl RegistryProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            app_names: Vec::new(),
            apps: RwLock::new(Vec::new()),
            specs: RwLock::new(Vec::new()),
        }
    }

    /// Connect to the default local registry
    pub fn local() -> Self {
        Self::new("http://localhost:8001")
    }

    /// Only expose tools belonging to the named apps
    pub fn with_apps(mut self, app_names: Vec<String>) -> Self {
        self.app_names = app_names;
        self
    }

    /// Check if the registry is running
    pub async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| error::tool_unavailable(e.to_string()).with_operation("registry::health_check"))?;

        Ok(response.status().is_success())
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, path))
            .send()
            .await
            .map_err(|e| error::tool_unavailable(e.to_string()).with_operation("registry::fetch"))?;

        if !response.status().is_success() {
            return Err(error::tool_unavailable(format!(
                "registry returned status {}",
                response.status().as_u16()
            ))
            .with_context("path", path.to_string()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| error::parse_error(e.to_string()).with_operation("registry::fetch"))
    }
}

impl ToolProvider for RegistryProvider {
    async fn initialize(&self) -> Result<()> {
        let mut apps: Vec<AppDefinition> = self.fetch_json("apps").await?;
        let mut specs: Vec<ToolSpec> = self.fetch_json("tools").await?;

        if !self.app_names.is_empty() {
            apps.retain(|a| self.app_names.contains(&a.name));
            // Registry tool names are prefixed "{app}__{tool}"
            specs.retain(|s| {
                self.app_names
                    .iter()
                    .any(|app| s.name.starts_with(&format!("{}__", app)))
            });
        }

        *self.apps.write().unwrap() = apps;
        *self.specs.write().unwrap() = specs;

        Ok(())
    }

    async fn apps(&self) -> Result<Vec<AppDefinition>> {
        Ok(self.apps.read().unwrap().clone())
    }

    async fn tools(&self) -> Result<Vec<ToolSpec>> {
        Ok(self.specs.read().unwrap().clone())
    }

    async fn call(&self, name: &str, args: serde_json::Value) -> Result<serde_json::Value> {
        let known = self.specs.read().unwrap().iter().any(|s| s.name == name);
        if !known {
            return Err(error::tool_not_found(name).with_operation("registry::call"));
        }

        let response = self
            .client
            .post(format!("{}/call", self.base_url))
            .json(&CallRequest { name, args })
            .send()
            .await
            .map_err(|e| error::tool_unavailable(e.to_string()).with_operation("registry::call"))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(error::tool_failed(name, text)
                .with_operation("registry::call")
                .with_context("status", status.to_string()));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| error::parse_error(e.to_string()).with_operation("registry::call"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_constructors() {
        let provider = RegistryProvider::local();
        assert_eq!(provider.base_url, "http://localhost:8001");

        let provider = RegistryProvider::new("http://localhost:9000")
            .with_apps(vec!["digital_sales".into()]);
        assert_eq!(provider.app_names, vec!["digital_sales".to_string()]);
    }

    #[tokio::test]
    async fn test_call_unknown_before_initialize() {
        // Nothing cached yet, so every name is unknown and no network call is made
        let provider = RegistryProvider::local();
        let err = provider.call("anything", serde_json::json!({})).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ToolNotFound);
    }
}
