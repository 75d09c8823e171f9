//! Tools module - functions the model can call
//!
//! Every tool returns a JSON value. Network and parse failures are caught
//! inside the tool and reported as `{"error": "..."}`, so a failing tool is
//! data for the model rather than a failed turn.

pub mod air_quality;
pub mod email;
pub mod registry;
pub mod shelter;
pub mod weather;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::ToolDefinition;

pub use air_quality::AirQualityTool;
pub use email::EmailTool;
pub use registry::ToolRegistry;
pub use shelter::ShelterTool;
pub use weather::WeatherTool;

/// A function exposed to the model
#[async_trait]
pub trait Tool: Send + Sync {
    /// Schema sent with every tool-bearing completion
    fn definition(&self) -> ToolDefinition;

    /// Run with already-parsed arguments
    async fn execute(&self, args: Value) -> Value;
}

/// Error payload returned to the model
pub fn error_payload(message: impl Into<String>) -> Value {
    json!({ "error": message.into() })
}

/// Read a required numeric argument
pub(crate) fn number_arg(args: &Value, key: &str) -> Result<f64, Value> {
    args.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| error_payload(format!("Missing or invalid argument: {}", key)))
}

/// Read a required string argument
pub(crate) fn string_arg<'a>(args: &'a Value, key: &str) -> Result<&'a str, Value> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| error_payload(format!("Missing or invalid argument: {}", key)))
}

/// Latitude/longitude parameter schema shared by the lookup tools
pub(crate) fn coordinate_properties() -> Value {
    json!({
        "latitude": {
            "type": "number",
            "description": "The latitude of the location, e.g., 37.7749"
        },
        "longitude": {
            "type": "number",
            "description": "The longitude of the location, e.g., -122.4194"
        }
    })
}
