use chrono::NaiveDateTime;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ============================================================================
// OpenWeatherMap API Models
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CurrentWeatherResponse {
    pub name: String,
    pub main: MainData,
    pub weather: Vec<WeatherCondition>,
    pub wind: WindData,
}

#[derive(Debug, Deserialize)]
pub struct MainData {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: i64,
    pub pressure: i64,
}

#[derive(Debug, Deserialize)]
pub struct WeatherCondition {
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct WindData {
    pub speed: f64,
}

// ============================================================================
// Domain Models
// ============================================================================

/// One parsed weather observation, not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub city: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: i64,
    /// Hectopascals, as reported by the API.
    pub pressure: i64,
    pub description: String,
    pub wind_speed: f64,
    pub timestamp: NaiveDateTime,
}

/// A row of `weather_history`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRecord {
    pub id: Option<i64>,
    pub city: String,
    /// Defaults to the current time on insert when unset.
    pub timestamp: Option<NaiveDateTime>,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: i64,
    pub pressure: i64,
    pub description: String,
    pub wind_speed: f64,
    pub response_time_ms: i64,
    pub created_at: Option<NaiveDateTime>,
}

impl WeatherRecord {
    pub fn from_snapshot(snapshot: &WeatherSnapshot, response_time_ms: u64) -> Self {
        Self {
            id: None,
            city: snapshot.city.clone(),
            timestamp: Some(snapshot.timestamp),
            temperature: snapshot.temperature,
            feels_like: snapshot.feels_like,
            humidity: snapshot.humidity,
            pressure: snapshot.pressure,
            description: snapshot.description.clone(),
            wind_speed: snapshot.wind_speed,
            response_time_ms: i64::try_from(response_time_ms).unwrap_or(i64::MAX),
            created_at: None,
        }
    }
}

/// A row of `notification_rules`. Fields hold the stored text; see
/// [`crate::rules::Condition`] for the compiled form.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRule {
    pub id: i64,
    pub name: String,
    pub condition_type: String,
    pub operator: String,
    pub threshold_value: String,
    pub message_template: String,
    pub icon: String,
    /// Lower is more urgent.
    pub priority: i64,
    pub is_active: bool,
    pub created_at: Option<NaiveDateTime>,
}

/// A row of `issued_notifications`.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedNotification {
    pub id: Option<i64>,
    pub history_id: i64,
    pub rule_id: i64,
    pub message: String,
    pub created_at: Option<NaiveDateTime>,
}

impl IssuedNotification {
    pub fn new(history_id: i64, rule_id: i64, message: impl Into<String>) -> Self {
        Self {
            id: None,
            history_id,
            rule_id,
            message: message.into(),
            created_at: None,
        }
    }
}

// ============================================================================
// MCP Tool Request Models
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct GetWeatherRequest {
    /// City name; the configured default is used when omitted
    pub city: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct GetHistoryRequest {
    /// Maximum number of records, newest first (0 = all)
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ExportHistoryRequest {
    /// File name inside the export directory
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct SetRuleActiveRequest {
    pub rule_id: i64,
    pub active: bool,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct SaveRuleRequest {
    /// Existing id to update, or a new id to insert
    pub id: i64,
    pub name: String,
    /// temperature, humidity, wind_speed, pressure, description, feels_like or temperature_humidity
    pub condition_type: String,
    /// gt, lt, gte, lte, eq or contains
    pub operator: String,
    pub threshold_value: String,
    /// Placeholders: {temperature}, {feels_like}, {humidity}, {pressure}, {wind_speed}, {description}, {city}
    pub message_template: String,
    pub icon: Option<String>,
    /// Lower is more urgent (default 1)
    pub priority: Option<i64>,
    /// Defaults to true
    pub is_active: Option<bool>,
}

impl SaveRuleRequest {
    pub fn into_rule(self) -> NotificationRule {
        NotificationRule {
            id: self.id,
            name: self.name,
            condition_type: self.condition_type,
            operator: self.operator,
            threshold_value: self.threshold_value,
            message_template: self.message_template,
            icon: self.icon.unwrap_or_default(),
            priority: self.priority.unwrap_or(1),
            is_active: self.is_active.unwrap_or(true),
            created_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_rule_request_fills_defaults() {
        let request: SaveRuleRequest = serde_json::from_value(serde_json::json!({
            "id": 20,
            "name": "Fog",
            "condition_type": "description",
            "operator": "contains",
            "threshold_value": "туман",
            "message_template": "Туман в {city}"
        }))
        .unwrap();

        let rule = request.into_rule();
        assert_eq!(rule.id, 20);
        assert_eq!(rule.icon, "");
        assert_eq!(rule.priority, 1);
        assert!(rule.is_active);
        assert_eq!(rule.created_at, None);
    }
}
