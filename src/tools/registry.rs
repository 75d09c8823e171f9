//! Tool registry - manages and dispatches tool calls
//!
//! Tools are kept in registration order so the definitions sent to the
//! model are stable between requests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;

use crate::core::{Config, ConnectError, Result, ToolCall, ToolDefinition};
use crate::tools::{error_payload, AirQualityTool, EmailTool, ShelterTool, Tool, WeatherTool};

/// Fill in arguments the model may leave out and the loop can compute
pub fn inject_defaults(tool: &str, args: &mut Value, today: NaiveDate) {
    if tool != "get_air_quality" {
        return;
    }
    if let Value::Object(map) = args {
        let missing = map
            .get("date")
            .and_then(Value::as_str)
            .map_or(true, |d| d.trim().is_empty());
        if missing {
            map.insert(
                "date".to_string(),
                Value::String(today.format("%Y-%m-%d").to_string()),
            );
        }
    }
}

/// Registry of available tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    /// Position of each tool in `tools`, by function name
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in tool, sharing one HTTP client
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.tools.timeout_secs))
            .build()
            .map_err(|e| ConnectError::config(format!("Failed to build HTTP client: {}", e)))?;

        let mut registry = Self::new();
        registry.register(WeatherTool::new(client.clone(), &config.tools.weather_url));
        registry.register(ShelterTool::new(client.clone(), &config.tools.shelter_url));
        registry.register(AirQualityTool::new(
            client.clone(),
            &config.tools.airnow_url,
            config.tools.airnow_api_key.clone(),
        ));
        registry.register(EmailTool::new(
            client,
            &config.sendgrid.base_url,
            config.sendgrid.api_key.clone(),
            &config.sendgrid.sender,
        ));
        Ok(registry)
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.definition().function.name;
        let tool: Arc<dyn Tool> = Arc::new(tool);
        match self.index.get(&name) {
            Some(&pos) => self.tools[pos] = tool,
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Definitions for every registered tool, in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools
            .iter()
            .map(|t| t.definition().function.name)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Parse a model-issued call, inject loop defaults and execute it
    pub async fn execute_call(&self, call: &ToolCall, today: NaiveDate) -> Value {
        let mut args = match call.parse_arguments() {
            Ok(args) => args,
            Err(e) => {
                tracing::warn!(tool = %call.name, "Unparsable tool arguments: {}", e);
                return error_payload(format!("Invalid arguments for {}: {}", call.name, e));
            }
        };
        inject_defaults(&call.name, &mut args, today);
        self.execute(&call.name, args).await
    }

    /// Execute a tool by name. Unknown names produce an error payload.
    pub async fn execute(&self, name: &str, args: Value) -> Value {
        match self.index.get(name) {
            Some(&pos) => {
                tracing::debug!(tool = name, "Executing tool");
                self.tools[pos].execute(args).await
            }
            None => {
                tracing::warn!(tool = name, "Model requested an unknown tool");
                error_payload(format!("Unknown tool: {}", name))
            }
        }
    }
}
