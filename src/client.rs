use std::time::Instant;

use chrono::Utc;
use reqwest::Client;
use serde_json::Value;

use crate::config::Config;
use crate::constants::USER_AGENT;
use crate::error::FetchError;
use crate::models::{CurrentWeatherResponse, WeatherSnapshot};

/// Thin client for the OpenWeatherMap current weather endpoint
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
    language: String,
    units: String,
}

impl WeatherClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
            units: config.units.clone(),
        })
    }

    /// Fetches current weather for `city`. Returns the snapshot and the
    /// request duration in milliseconds.
    pub async fn fetch_snapshot(&self, city: &str) -> Result<(WeatherSnapshot, u64), FetchError> {
        let started = Instant::now();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("lang", self.language.as_str()),
                ("units", self.units.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let body = response.json::<Value>().await?;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        Ok((parse_snapshot(body)?, elapsed_ms))
    }
}

/// Picks the fields the notifier needs out of a raw API response.
pub fn parse_snapshot(body: Value) -> Result<WeatherSnapshot, FetchError> {
    let data: CurrentWeatherResponse =
        serde_json::from_value(body).map_err(|e| FetchError::DataShape(e.to_string()))?;

    let description = data
        .weather
        .into_iter()
        .next()
        .map(|w| w.description)
        .ok_or_else(|| FetchError::DataShape("empty 'weather' list".to_string()))?;

    Ok(WeatherSnapshot {
        city: data.name,
        temperature: data.main.temp,
        feels_like: data.main.feels_like,
        humidity: data.main.humidity,
        pressure: data.main.pressure,
        description,
        wind_speed: data.wind.speed,
        timestamp: Utc::now().naive_utc(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_openweathermap_payload() {
        let body = json!({
            "name": "Москва",
            "main": {"temp": -2.4, "feels_like": -6.9, "humidity": 86, "pressure": 1021},
            "weather": [{"id": 600, "description": "небольшой снег"}],
            "wind": {"speed": 4.1, "deg": 200},
            "dt": 1705305600
        });

        let snapshot = parse_snapshot(body).unwrap();
        assert_eq!(snapshot.city, "Москва");
        assert_eq!(snapshot.temperature, -2.4);
        assert_eq!(snapshot.feels_like, -6.9);
        assert_eq!(snapshot.humidity, 86);
        assert_eq!(snapshot.pressure, 1021);
        assert_eq!(snapshot.description, "небольшой снег");
        assert_eq!(snapshot.wind_speed, 4.1);
    }

    #[test]
    fn missing_fields_are_data_shape_errors() {
        let body = json!({
            "name": "Москва",
            "main": {"temp": -2.4, "humidity": 86, "pressure": 1021},
            "weather": [{"description": "снег"}],
            "wind": {"speed": 4.1}
        });
        assert!(matches!(parse_snapshot(body), Err(FetchError::DataShape(_))));

        let body = json!({
            "name": "Москва",
            "main": {"temp": -2.4, "feels_like": -5.0, "humidity": 86, "pressure": 1021},
            "weather": [],
            "wind": {"speed": 4.1}
        });
        assert!(matches!(parse_snapshot(body), Err(FetchError::DataShape(_))));
    }
}
