//! Current weather lookup
//!
//! Backed by the Open-Meteo forecast API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::ToolDefinition;
use crate::tools::{coordinate_properties, error_payload, number_arg, Tool};

const KPH_TO_MPH: f64 = 0.621371;

/// `get_current_weather(latitude, longitude)`
pub struct WeatherTool {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: Option<CurrentWeather>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: f64,
    windspeed: f64,
    #[serde(default)]
    humidity: Option<f64>,
}

impl WeatherTool {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
        celsius * 9.0 / 5.0 + 32.0
    }

    pub fn kph_to_mph(kph: f64) -> f64 {
        kph * KPH_TO_MPH
    }

    async fn lookup(&self, latitude: f64, longitude: f64) -> Value {
        let response = match self
            .client
            .get(format!("{}/v1/forecast", self.base_url))
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current_weather", "true".to_string()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(r) => r,
            Err(e) => return error_payload(format!("Failed to fetch weather data: {}", e)),
        };

        let forecast: ForecastResponse = match response.json().await {
            Ok(f) => f,
            Err(_) => return error_payload("Unexpected response format"),
        };

        match forecast.current_weather {
            Some(current) => json!({
                "temperature_C": current.temperature,
                "temperature_F": Self::celsius_to_fahrenheit(current.temperature),
                "wind_speed_mph": Self::kph_to_mph(current.windspeed),
                "humidity": current.humidity.map(Value::from).unwrap_or_else(|| json!("N/A")),
                "latitude": latitude,
                "longitude": longitude,
            }),
            None => error_payload("Current weather data not available"),
        }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            "get_current_weather",
            "Get the current weather using latitude and longitude",
            json!({
                "type": "object",
                "properties": coordinate_properties(),
                "required": ["latitude", "longitude"],
                "additionalProperties": false
            }),
            true,
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
        self.lookup(latitude, longitude).await
    }
}
