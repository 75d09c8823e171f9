//! Air quality forecast lookup
//!
//! Backed by the AirNow forecast-by-coordinate API. The conversation loop
//! fills in `date` with today's date when the model leaves it out.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::ToolDefinition;
use crate::tools::{coordinate_properties, error_payload, number_arg, string_arg, Tool};

/// Search distance in miles around the coordinate
const SEARCH_DISTANCE: &str = "25";

/// `get_air_quality(latitude, longitude, date)`
pub struct AirQualityTool {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Forecast {
    date_forecast: String,
    parameter_name: String,
    #[serde(rename = "AQI")]
    aqi: i64,
    category: Category,
    #[serde(default)]
    reporting_area: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Category {
    name: String,
}

impl AirQualityTool {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn lookup(&self, latitude: f64, longitude: f64, date: &str) -> Value {
        let Some(api_key) = self.api_key.as_deref() else {
            return error_payload("AIRNOW_API_KEY is not configured");
        };

        let lat = latitude.to_string();
        let lon = longitude.to_string();
        let response = match self
            .client
            .get(format!("{}/aq/forecast/latLong/", self.base_url))
            .query(&[
                ("format", "application/json"),
                ("latitude", lat.as_str()),
                ("longitude", lon.as_str()),
                ("date", date),
                ("distance", SEARCH_DISTANCE),
                ("API_KEY", api_key),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(r) => r,
            Err(e) => return error_payload(format!("Failed to fetch air quality data: {}", e)),
        };

        let forecasts: Vec<Forecast> = match response.json().await {
            Ok(f) => f,
            Err(_) => return error_payload("Unexpected response format"),
        };

        let forecasts: Vec<Value> = forecasts
            .into_iter()
            .map(|f| {
                json!({
                    "date": f.date_forecast.trim(),
                    "parameter": f.parameter_name,
                    "aqi": f.aqi,
                    "category": f.category.name,
                    "reporting_area": f.reporting_area,
                })
            })
            .collect();

        json!({
            "latitude": latitude,
            "longitude": longitude,
            "date": date,
            "forecasts": forecasts,
        })
    }
}

#[async_trait]
impl Tool for AirQualityTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = coordinate_properties();
        properties["date"] = json!({
            "type": "string",
            "description": "Forecast start date as YYYY-MM-DD; defaults to today"
        });

        ToolDefinition::function(
            "get_air_quality",
            "Get the daily air quality (AQI) forecast for a latitude and longitude",
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
        let date = match string_arg(&args, "date") {
            Ok(v) => v,
            Err(e) => return e,
        };
        self.lookup(latitude, longitude, date).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_forecast_mapping() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/aq/forecast/latLong/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("format".into(), "application/json".into()),
                Matcher::UrlEncoded("date".into(), "2026-10-18".into()),
                Matcher::UrlEncoded("distance".into(), "25".into()),
                Matcher::UrlEncoded("API_KEY".into(), "air-key".into()),
            ]))
            .with_status(200)
            .with_body(
                json!([
                    {
                        "DateIssue": "2026-10-18 ",
                        "DateForecast": "2026-10-18 ",
                        "ReportingArea": "San Francisco",
                        "ParameterName": "PM2.5",
                        "AQI": 42,
                        "Category": {"Number": 1, "Name": "Good"}
                    },
                    {
                        "DateIssue": "2026-10-18 ",
                        "DateForecast": "2026-10-19 ",
                        "ReportingArea": "San Francisco",
                        "ParameterName": "PM2.5",
                        "AQI": 112,
                        "Category": {"Number": 3, "Name": "Unhealthy for Sensitive Groups"}
                    }
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let tool = AirQualityTool::new(Client::new(), server.url(), Some("air-key".to_string()));
        let result = tool
            .execute(json!({"latitude": 37.7749, "longitude": -122.4194, "date": "2026-10-18"}))
            .await;

        mock.assert_async().await;
        assert_eq!(result["forecasts"][0]["date"], "2026-10-18");
        assert_eq!(result["forecasts"][0]["category"], "Good");
        assert_eq!(result["forecasts"][1]["aqi"], 112);
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let tool = AirQualityTool::new(Client::new(), "http://127.0.0.1:9", None);
        let result = tool
            .execute(json!({"latitude": 1.0, "longitude": 2.0, "date": "2026-10-18"}))
            .await;
        assert_eq!(result["error"], "AIRNOW_API_KEY is not configured");
    }

    #[tokio::test]
    async fn test_connection_failure_is_error_payload() {
        let tool = AirQualityTool::new(Client::new(), "http://127.0.0.1:9", Some("k".to_string()));
        let result = tool
            .execute(json!({"latitude": 1.0, "longitude": 2.0, "date": "2026-10-18"}))
            .await;
        assert!(result["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to fetch air quality data"));
    }

    #[tokio::test]
    async fn test_unexpected_shape() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/aq/forecast/latLong/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"WebServiceError": "Invalid API key"}"#)
            .create_async()
            .await;

        let tool = AirQualityTool::new(Client::new(), server.url(), Some("k".to_string()));
        let result = tool
            .execute(json!({"latitude": 1.0, "longitude": 2.0, "date": "2026-10-18"}))
            .await;
        assert_eq!(result["error"], "Unexpected response format");
    }
}
