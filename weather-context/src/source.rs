//! Raw current-weather data.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::WeatherConfig;
use crate::errors::WeatherError;

/// Variables requested from Open-Meteo's `current` block.
const CURRENT_FIELDS: &str = "temperature_2m,apparent_temperature,relative_humidity_2m,precipitation,weather_code,cloud_cover,wind_speed_10m";

/// Produces a compact, model-readable description of the current weather.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_current(&self) -> Result<String, WeatherError>;
}

/// Open-Meteo forecast API (no key required).
#[derive(Debug)]
pub struct OpenMeteoSource {
    client: reqwest::Client,
    cfg: WeatherConfig,
}

impl OpenMeteoSource {
    pub fn new(cfg: WeatherConfig) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self { client, cfg })
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoSource {
    #[instrument(skip_all, fields(lat = self.cfg.latitude, lon = self.cfg.longitude))]
    async fn fetch_current(&self) -> Result<String, WeatherError> {
        let resp = self
            .client
            .get(&self.cfg.api_url)
            .query(&[
                ("latitude", self.cfg.latitude.to_string()),
                ("longitude", self.cfg.longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body: String = resp.text().await.unwrap_or_default().chars().take(240).collect();
            return Err(WeatherError::Status { status, body });
        }

        let body: Value = resp.json().await?;
        let current = extract_current(&body)?;
        debug!(len = current.len(), "weather data fetched");
        Ok(current)
    }
}

/// Pairs each `current` value with its unit: `temperature_2m: 21.3 °C, ...`.
fn extract_current(body: &Value) -> Result<String, WeatherError> {
    let current = body
        .get("current")
        .and_then(Value::as_object)
        .ok_or_else(|| WeatherError::Decode("missing `current` object".into()))?;
    let units = body.get("current_units").and_then(Value::as_object);

    let parts: Vec<String> = current
        .iter()
        .filter(|(k, _)| k.as_str() != "interval")
        .map(|(k, v)| {
            let unit = units
                .and_then(|u| u.get(k))
                .and_then(Value::as_str)
                .filter(|u| !u.is_empty() && *u != "iso8601");
            let value = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
            match unit {
                Some(unit) => format!("{k}: {value} {unit}"),
                None => format!("{k}: {value}"),
            }
        })
        .collect();

    if parts.is_empty() {
        return Err(WeatherError::Decode("empty `current` object".into()));
    }
    Ok(parts.join(", "))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn extracts_values_with_units() {
        let body = json!({
            "current_units": {"time": "iso8601", "interval": "seconds", "temperature_2m": "°C", "weather_code": "wmo code"},
            "current": {"time": "2024-06-01T12:00", "interval": 900, "temperature_2m": 21.3, "weather_code": 3}
        });
        let text = extract_current(&body).unwrap();
        assert!(text.contains("temperature_2m: 21.3 °C"));
        assert!(text.contains("weather_code: 3 wmo code"));
        assert!(text.contains("time: 2024-06-01T12:00"));
        assert!(!text.contains("interval"));
    }

    #[test]
    fn missing_current_is_a_decode_error() {
        assert!(matches!(
            extract_current(&json!({"error": true})),
            Err(WeatherError::Decode(_))
        ));
    }
}
