//! Shelter lookup near a coordinate

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::ToolDefinition;
use crate::tools::{coordinate_properties, error_payload, number_arg, Tool};

const DEFAULT_RADIUS_METERS: u64 = 50_000;
const DEFAULT_LIMIT: u64 = 10;

/// `get_shelter_info(latitude, longitude, radius?, limit?)`
pub struct ShelterTool {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ShelterResponse {
    #[serde(default)]
    shelters: Vec<Value>,
}

/// Fields copied from each upstream shelter record, upstream key first
const SHELTER_FIELDS: &[(&str, &str)] = &[
    ("id", "shelter_id"),
    ("name", "name"),
    ("address", "address"),
    ("city", "city"),
    ("state", "state"),
    ("postal_code", "postal_code"),
    ("latitude", "latitude"),
    ("longitude", "longitude"),
    ("capacity", "capacity"),
    ("current_occupancy", "current_occupancy"),
    ("status", "status"),
];

impl ShelterTool {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn summarize(shelter: &Value) -> Value {
        let mut out = serde_json::Map::new();
        for (from, to) in SHELTER_FIELDS {
            out.insert(
                to.to_string(),
                shelter.get(*from).cloned().unwrap_or(Value::Null),
            );
        }
        Value::Object(out)
    }

    async fn lookup(&self, latitude: f64, longitude: f64, radius: u64, limit: u64) -> Value {
        let response = match self
            .client
            .get(format!("{}/shelters", self.base_url))
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("radius", radius.to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(r) => r,
            Err(e) => return error_payload(format!("Failed to fetch shelter data: {}", e)),
        };

        let data: ShelterResponse = match response.json().await {
            Ok(d) => d,
            Err(_) => return error_payload("Unexpected response format"),
        };

        let shelters: Vec<Value> = data.shelters.iter().map(Self::summarize).collect();
        json!({
            "latitude": latitude,
            "longitude": longitude,
            "radius_meters": radius,
            "shelters": shelters,
        })
    }
}

#[async_trait]
impl Tool for ShelterTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = coordinate_properties();
        properties["radius"] = json!({
            "type": "integer",
            "description": "The search radius in meters, e.g., 50000"
        });
        properties["limit"] = json!({
            "type": "integer",
            "description": "The maximum number of results to return, e.g., 10"
        });

        ToolDefinition::function(
            "get_shelter_info",
            "Get real-time information about shelters near a given latitude and longitude",
            json!({
                "type": "object",
                "properties": properties,
                "required": ["latitude", "longitude"],
                "additionalProperties": false
            }),
            false,
        )
    }

    async fn execute(&self, args: Value) -> Value {
        let latitude = match number_arg(&args, "latitude") {
            Ok(v) => v,
            Err(e) => return e,
        };
        let longitude = match number_arg(&args, "longitude") {
            Ok(v) => v,
            Err(e) => return e,
        };
        let radius = args
            .get("radius")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_RADIUS_METERS);
        let limit = args
            .get("limit")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_LIMIT);

        self.lookup(latitude, longitude, radius, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_defaults_and_field_mapping() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/shelters")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("lat".into(), "29.76".into()),
                Matcher::UrlEncoded("lon".into(), "-95.37".into()),
                Matcher::UrlEncoded("radius".into(), "50000".into()),
                Matcher::UrlEncoded("limit".into(), "10".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "shelters": [{
                        "id": "s-42",
                        "name": "George R. Brown Convention Center",
                        "city": "Houston",
                        "state": "TX",
                        "capacity": 10000,
                        "current_occupancy": 8500,
                        "status": "open",
                        "internal_note": "not forwarded"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let tool = ShelterTool::new(Client::new(), server.url());
        let result = tool
            .execute(json!({"latitude": 29.76, "longitude": -95.37}))
            .await;

        mock.assert_async().await;
        assert_eq!(result["radius_meters"], 50000);
        let shelter = &result["shelters"][0];
        assert_eq!(shelter["shelter_id"], "s-42");
        assert_eq!(shelter["status"], "open");
        assert_eq!(shelter["address"], Value::Null);
        assert!(shelter.get("internal_note").is_none());
    }

    #[tokio::test]
    async fn test_connection_failure_is_error_payload() {
        let tool = ShelterTool::new(Client::new(), "http://127.0.0.1:9");
        let result = tool.execute(json!({"latitude": 1.0, "longitude": 2.0})).await;
        assert!(result["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to fetch shelter data"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_error_payload() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/shelters")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let tool = ShelterTool::new(Client::new(), server.url());
        let result = tool.execute(json!({"latitude": 29.76, "longitude": -95.37})).await;
        assert_eq!(result["error"], "Unexpected response format");
    }

    #[test]
    fn test_schema_is_not_strict() {
        let tool = ShelterTool::new(Client::new(), "http://localhost");
        let def = tool.definition();
        assert!(!def.function.strict);
        assert!(def.function.parameters["properties"]["radius"].is_object());
    }
}
