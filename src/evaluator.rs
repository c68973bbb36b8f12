//! Rule evaluation against a weather snapshot and message rendering.

use crate::constants::HPA_TO_MMHG;
use crate::error::RuleError;
use crate::models::{NotificationRule, WeatherSnapshot};
use crate::rules::{Condition, Metric};

/// Converts hectopascals to millimeters of mercury, rounded to the nearest integer.
pub fn hpa_to_mmhg(hpa: i64) -> i64 {
    (hpa as f64 * HPA_TO_MMHG).round() as i64
}

impl Condition {
    pub fn matches(&self, snapshot: &WeatherSnapshot) -> bool {
        match self {
            Self::Numeric {
                metric,
                operator,
                threshold,
            } => {
                let value = match metric {
                    Metric::Temperature => snapshot.temperature,
                    Metric::Humidity => snapshot.humidity as f64,
                    Metric::WindSpeed => snapshot.wind_speed,
                    Metric::Pressure => hpa_to_mmhg(snapshot.pressure) as f64,
                };
                operator.compare(value, *threshold).unwrap_or(false)
            }
            Self::FeelsLikeBelow(threshold) => snapshot.feels_like < *threshold,
            Self::TemperatureHumidityAbove(threshold) => {
                snapshot.temperature * snapshot.humidity as f64 / 100.0 > *threshold
            }
            Self::DescriptionContains(needle) => {
                snapshot.description.to_lowercase().contains(needle.as_str())
            }
            Self::Never => false,
        }
    }
}

/// Decides whether `rule` fires for `snapshot`.
pub fn evaluate(rule: &NotificationRule, snapshot: &WeatherSnapshot) -> Result<bool, RuleError> {
    Ok(Condition::compile(rule)?.matches(snapshot))
}

/// Renders the rule's message template. Unknown placeholders are left as-is.
pub fn format_message(rule: &NotificationRule, snapshot: &WeatherSnapshot) -> String {
    let placeholders = [
        ("{temperature}", format!("{:.1}", snapshot.temperature)),
        ("{feels_like}", format!("{:.1}", snapshot.feels_like)),
        ("{humidity}", snapshot.humidity.to_string()),
        ("{pressure}", hpa_to_mmhg(snapshot.pressure).to_string()),
        ("{wind_speed}", format!("{:.1}", snapshot.wind_speed)),
        ("{description}", snapshot.description.clone()),
        ("{city}", snapshot.city.clone()),
    ];

    placeholders
        .iter()
        .fold(rule.message_template.clone(), |message, (key, value)| {
            message.replace(key, value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            city: "Москва".to_string(),
            temperature: -2.0,
            feels_like: -6.0,
            humidity: 50,
            pressure: 1013,
            description: "Легкий снег".to_string(),
            wind_speed: 5.0,
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
        }
    }

    fn rule(condition_type: &str, operator: &str, threshold: &str) -> NotificationRule {
        NotificationRule {
            id: 1,
            name: "test".to_string(),
            condition_type: condition_type.to_string(),
            operator: operator.to_string(),
            threshold_value: threshold.to_string(),
            message_template: String::new(),
            icon: String::new(),
            priority: 1,
            is_active: true,
            created_at: None,
        }
    }

    #[test]
    fn pressure_conversion_rounds() {
        assert_eq!(hpa_to_mmhg(1013), 760);
        assert_eq!(hpa_to_mmhg(973), 730);
        assert_eq!(hpa_to_mmhg(972), 729);
        assert_eq!(hpa_to_mmhg(0), 0);
    }

    #[test]
    fn low_pressure_boundary() {
        let low = rule("pressure", "lt", "730");
        let mut s = snapshot();
        s.pressure = 972;
        assert!(evaluate(&low, &s).unwrap());
        s.pressure = 973;
        assert!(!evaluate(&low, &s).unwrap());
        assert!(evaluate(&rule("pressure", "lte", "730"), &s).unwrap());
        s.pressure = 974;
        assert!(!evaluate(&rule("pressure", "lte", "730"), &s).unwrap());
    }

    #[test]
    fn operators_compare_numeric_fields() {
        let s = snapshot();
        assert!(evaluate(&rule("temperature", "lt", "0"), &s).unwrap());
        assert!(!evaluate(&rule("temperature", "gt", "0"), &s).unwrap());
        assert!(evaluate(&rule("humidity", "gte", "50"), &s).unwrap());
        assert!(evaluate(&rule("humidity", "lte", "50"), &s).unwrap());
        assert!(evaluate(&rule("humidity", "eq", "50"), &s).unwrap());
        assert!(!evaluate(&rule("wind_speed", "gt", "10"), &s).unwrap());
    }

    #[test]
    fn combined_conditions() {
        let mut s = snapshot();
        assert!(evaluate(&rule("feels_like", "lt", "-5"), &s).unwrap());
        s.feels_like = -5.0;
        assert!(!evaluate(&rule("feels_like", "lt", "-5"), &s).unwrap());

        s.temperature = 30.0;
        s.humidity = 90;
        // 30 * 90 / 100 = 27
        assert!(evaluate(&rule("temperature_humidity", "gt", "20"), &s).unwrap());
        assert!(!evaluate(&rule("temperature_humidity", "gt", "75"), &s).unwrap());
        s.humidity = 25;
        assert!(!evaluate(&rule("temperature_humidity", "gt", "20"), &s).unwrap());
    }

    #[test]
    fn description_match_is_case_insensitive() {
        let s = snapshot();
        assert!(evaluate(&rule("description", "contains", "СНЕГ"), &s).unwrap());
        assert!(!evaluate(&rule("description", "contains", "дождь"), &s).unwrap());
    }

    #[test]
    fn unknown_condition_never_fires() {
        assert!(!evaluate(&rule("visibility", "lt", "100"), &snapshot()).unwrap());
        assert!(!evaluate(&rule("temperature", "approx", "-2"), &snapshot()).unwrap());
    }

    #[test]
    fn malformed_threshold_surfaces_error() {
        assert!(evaluate(&rule("temperature", "lt", "abc"), &snapshot()).is_err());
    }

    #[test]
    fn message_placeholders_are_rendered() {
        let mut r = rule("temperature", "lt", "5");
        r.message_template =
            "{city}: {temperature}°C ({feels_like}), {humidity}%, {pressure} мм, {wind_speed} м/с, {description}, {unknown}"
                .to_string();
        assert_eq!(
            format_message(&r, &snapshot()),
            "Москва: -2.0°C (-6.0), 50%, 760 мм, 5.0 м/с, Легкий снег, {unknown}"
        );
    }
}
