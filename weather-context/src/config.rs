//! Weather settings from the environment.
//!
//! - `WEATHER_ENABLED` (default `false`)
//! - `WEATHER_LATITUDE`, `WEATHER_LONGITUDE` (required when enabled)
//! - `WEATHER_REFRESH_SECS` (default 3600)
//! - `WEATHER_API_URL` (default Open-Meteo forecast endpoint)

use std::time::Duration;

use ai_llm_service::error_handler::opt_bool;

use crate::errors::WeatherError;

pub const DEFAULT_API_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_REFRESH_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub refresh: Duration,
    pub api_url: String,
}

impl WeatherConfig {
    /// `Ok(None)` when weather injection is disabled.
    pub fn from_env() -> Result<Option<Self>, WeatherError> {
        Self::from_lookup(&|k| std::env::var(k).ok())
    }

    pub fn from_lookup(
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, WeatherError> {
        let get = |k: &str| env(k).filter(|v| !v.trim().is_empty());

        let enabled = opt_bool(env, "WEATHER_ENABLED")
            .map_err(|_| WeatherError::EnvParse {
                key: "WEATHER_ENABLED",
                value: env("WEATHER_ENABLED").unwrap_or_default(),
            })?
            .unwrap_or(false);
        if !enabled {
            return Ok(None);
        }

        let latitude = parse_coord(get("WEATHER_LATITUDE"), "WEATHER_LATITUDE", 90.0)?;
        let longitude = parse_coord(get("WEATHER_LONGITUDE"), "WEATHER_LONGITUDE", 180.0)?;

        let refresh_secs = match get("WEATHER_REFRESH_SECS") {
            None => DEFAULT_REFRESH_SECS,
            Some(v) => match v.trim().parse::<u64>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(WeatherError::EnvParse {
                        key: "WEATHER_REFRESH_SECS",
                        value: v,
                    });
                }
            },
        };

        let api_url = get("WEATHER_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(WeatherError::Config(
                "WEATHER_API_URL must start with http:// or https://".into(),
            ));
        }

        Ok(Some(Self {
            latitude,
            longitude,
            refresh: Duration::from_secs(refresh_secs),
            api_url,
        }))
    }
}

fn parse_coord(raw: Option<String>, key: &'static str, limit: f64) -> Result<f64, WeatherError> {
    let raw = raw.ok_or_else(|| {
        WeatherError::Config(format!("{key} is required when WEATHER_ENABLED=true"))
    })?;
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v.abs() <= limit => Ok(v),
        _ => Err(WeatherError::EnvParse { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn disabled_by_default() {
        assert_eq!(WeatherConfig::from_lookup(&lookup(&[])).unwrap(), None);
    }

    #[test]
    fn enabled_requires_coordinates() {
        let env = lookup(&[("WEATHER_ENABLED", "true"), ("WEATHER_LATITUDE", "40.7")]);
        assert!(matches!(
            WeatherConfig::from_lookup(&env),
            Err(WeatherError::Config(_))
        ));

        let env = lookup(&[
            ("WEATHER_ENABLED", "true"),
            ("WEATHER_LATITUDE", "40.7"),
            ("WEATHER_LONGITUDE", "-74.0"),
        ]);
        let cfg = WeatherConfig::from_lookup(&env).unwrap().unwrap();
        assert_eq!(cfg.refresh, Duration::from_secs(3600));
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.longitude, -74.0);
    }

    #[test]
    fn enabled_flag_accepts_common_spellings() {
        let env = lookup(&[
            ("WEATHER_ENABLED", "on"),
            ("WEATHER_LATITUDE", "51.5"),
            ("WEATHER_LONGITUDE", "-0.1"),
        ]);
        assert!(WeatherConfig::from_lookup(&env).unwrap().is_some());

        let env = lookup(&[("WEATHER_ENABLED", "no")]);
        assert_eq!(WeatherConfig::from_lookup(&env).unwrap(), None);

        let env = lookup(&[("WEATHER_ENABLED", "maybe")]);
        assert!(matches!(
            WeatherConfig::from_lookup(&env),
            Err(WeatherError::EnvParse {
                key: "WEATHER_ENABLED",
                ..
            })
        ));
    }

    #[test]
    fn out_of_range_latitude_is_rejected() {
        let env = lookup(&[
            ("WEATHER_ENABLED", "1"),
            ("WEATHER_LATITUDE", "123"),
            ("WEATHER_LONGITUDE", "0"),
        ]);
        assert!(matches!(
            WeatherConfig::from_lookup(&env),
            Err(WeatherError::EnvParse {
                key: "WEATHER_LATITUDE",
                ..
            })
        ));
    }
}
