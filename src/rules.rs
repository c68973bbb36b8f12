//! Notification rule catalog and compilation of stored rules into conditions.

use crate::error::RuleError;
use crate::models::NotificationRule;

/// Comparison applied between a snapshot value and a rule threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Gt,
    Lt,
    Gte,
    Lte,
    Eq,
    Contains,
}

impl Operator {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gt" => Some(Self::Gt),
            "lt" => Some(Self::Lt),
            "gte" => Some(Self::Gte),
            "lte" => Some(Self::Lte),
            "eq" => Some(Self::Eq),
            "contains" => Some(Self::Contains),
            _ => None,
        }
    }

    /// Numeric comparison. `Contains` has no numeric meaning.
    pub fn compare(self, value: f64, threshold: f64) -> Option<bool> {
        match self {
            Self::Gt => Some(value > threshold),
            Self::Lt => Some(value < threshold),
            Self::Gte => Some(value >= threshold),
            Self::Lte => Some(value <= threshold),
            Self::Eq => Some(value == threshold),
            Self::Contains => None,
        }
    }
}

/// Snapshot field a numeric rule reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Temperature,
    Humidity,
    WindSpeed,
    /// Compared in mmHg.
    Pressure,
}

/// A stored rule with its threshold parsed for its condition type.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Numeric {
        metric: Metric,
        operator: Operator,
        threshold: f64,
    },
    /// Fires when feels-like is strictly below the threshold.
    FeelsLikeBelow(f64),
    /// Fires when `temperature * humidity / 100` is strictly above the threshold.
    TemperatureHumidityAbove(f64),
    /// Lower-cased substring of the description.
    DescriptionContains(String),
    /// Unknown condition type or operator.
    Never,
}

impl Condition {
    pub fn compile(rule: &NotificationRule) -> Result<Self, RuleError> {
        let metric = match rule.condition_type.as_str() {
            "feels_like" => return Ok(Self::FeelsLikeBelow(parse_threshold(rule)?)),
            "temperature_humidity" => {
                return Ok(Self::TemperatureHumidityAbove(parse_threshold(rule)?))
            }
            "description" => {
                return match Operator::parse(&rule.operator) {
                    Some(Operator::Contains) => Ok(Self::DescriptionContains(
                        rule.threshold_value.to_lowercase(),
                    )),
                    Some(_) => Err(mismatch(rule)),
                    None => Ok(Self::Never),
                };
            }
            "temperature" => Metric::Temperature,
            "humidity" => Metric::Humidity,
            "wind_speed" => Metric::WindSpeed,
            "pressure" => Metric::Pressure,
            _ => return Ok(Self::Never),
        };

        let threshold = parse_threshold(rule)?;
        match Operator::parse(&rule.operator) {
            Some(Operator::Contains) => Err(mismatch(rule)),
            Some(operator) => Ok(Self::Numeric {
                metric,
                operator,
                threshold,
            }),
            None => Ok(Self::Never),
        }
    }
}

fn parse_threshold(rule: &NotificationRule) -> Result<f64, RuleError> {
    rule.threshold_value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RuleError::InvalidThreshold {
            rule_id: rule.id,
            value: rule.threshold_value.clone(),
        })
}

fn mismatch(rule: &NotificationRule) -> RuleError {
    RuleError::OperatorMismatch {
        rule_id: rule.id,
        condition_type: rule.condition_type.clone(),
        operator: rule.operator.clone(),
    }
}

/// Seed row: (id, name, condition_type, operator, threshold, template, icon, priority).
pub type SeedRule = (
    i64,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    i64,
);

/// Rules inserted on first start. Ids are fixed so reseeding is a no-op.
pub const BASE_RULES: [SeedRule; 16] = [
    (1, "Холодно", "temperature", "lt", "5", "🧥 Наденьте куртку! На улице холодно ({temperature}°C)", "🧥", 1),
    (2, "Очень холодно", "temperature", "lt", "0", "❄️ Сильный мороз! Теплая одежда обязательна ({temperature}°C)", "❄️", 1),
    (3, "Жарко", "temperature", "gt", "25", "🥵 Жарко! Не забудьте воду и головной убор ({temperature}°C)", "🥵", 2),
    (4, "Дождь", "description", "contains", "дождь", "☔ Возьмите зонт! {description}", "☔", 1),
    (5, "Сильный дождь", "description", "contains", "ливень", "🌧️ Сильный дождь! Одевайтесь соответственно", "🌧️", 1),
    (6, "Снег", "description", "contains", "снег", "⛄ Идет снег! Одевайтесь теплее", "⛄", 1),
    (7, "Туман", "description", "contains", "туман", "🌫️ Туман! Будьте осторожны на дороге", "🌫️", 2),
    (8, "Гроза", "description", "contains", "гроза", "⛈️ Гроза! Оставайтесь в помещении", "⛈️", 1),
    (9, "Сильный ветер", "wind_speed", "gt", "10", "💨 Сильный ветер ({wind_speed} м/с)! Будьте осторожны", "💨", 2),
    (10, "Очень сильный ветер", "wind_speed", "gt", "15", "🌪️ Очень сильный ветер ({wind_speed} м/с)! Лучше остаться дома", "🌪️", 1),
    (11, "Высокая влажность", "humidity", "gt", "80", "💧 Высокая влажность ({humidity}%). Одежда сохнет медленно", "💧", 3),
    (12, "Очень сухо", "humidity", "lt", "30", "🏜️ Очень сухо ({humidity}%). Пейте больше воды", "🏜️", 3),
    (13, "Низкое давление", "pressure", "lt", "730", "📉 Низкое давление ({pressure} мм рт.ст.). Метеозависимым быть осторожнее", "📉", 3),
    (14, "Высокое давление", "pressure", "gt", "780", "📈 Высокое давление ({pressure} мм рт.ст.)", "📈", 3),
    (15, "Холодно + Ветер", "feels_like", "lt", "-5", "🥶 Холодно с ветром! Ощущается как {feels_like}°C. Оденьтесь теплее!", "🥶", 1),
    (16, "Жарко + Влажность", "temperature_humidity", "gt", "75", "🔥 Душно и жарко! {temperature}°C и {humidity}% влажности", "🔥", 2),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(condition_type: &str, operator: &str, threshold: &str) -> NotificationRule {
        NotificationRule {
            id: 99,
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
    fn numeric_rules_compile_with_operator() {
        assert_eq!(
            Condition::compile(&rule("wind_speed", "gte", "10.5")).unwrap(),
            Condition::Numeric {
                metric: Metric::WindSpeed,
                operator: Operator::Gte,
                threshold: 10.5,
            }
        );
    }

    #[test]
    fn combined_rules_ignore_stored_operator() {
        assert_eq!(
            Condition::compile(&rule("feels_like", "gt", "-5")).unwrap(),
            Condition::FeelsLikeBelow(-5.0)
        );
        assert_eq!(
            Condition::compile(&rule("temperature_humidity", "lt", "75")).unwrap(),
            Condition::TemperatureHumidityAbove(75.0)
        );
    }

    #[test]
    fn description_needle_is_lowercased() {
        assert_eq!(
            Condition::compile(&rule("description", "contains", "ГРОЗА")).unwrap(),
            Condition::DescriptionContains("гроза".to_string())
        );
    }

    #[test]
    fn unknown_type_or_operator_never_fires() {
        assert_eq!(Condition::compile(&rule("uv_index", "gt", "5")).unwrap(), Condition::Never);
        assert_eq!(Condition::compile(&rule("humidity", "between", "5")).unwrap(), Condition::Never);
        assert_eq!(Condition::compile(&rule("description", "like", "rain")).unwrap(), Condition::Never);
    }

    #[test]
    fn malformed_threshold_is_an_error() {
        assert_eq!(
            Condition::compile(&rule("temperature", "lt", "abc")).unwrap_err(),
            RuleError::InvalidThreshold {
                rule_id: 99,
                value: "abc".to_string(),
            }
        );
        assert!(Condition::compile(&rule("feels_like", "lt", "")).is_err());
        assert!(Condition::compile(&rule("pressure", "lt", "NaN")).is_err());
    }

    #[test]
    fn operator_must_fit_condition_type() {
        assert!(matches!(
            Condition::compile(&rule("description", "eq", "ясно")),
            Err(RuleError::OperatorMismatch { .. })
        ));
        assert!(matches!(
            Condition::compile(&rule("temperature", "contains", "5")),
            Err(RuleError::OperatorMismatch { .. })
        ));
    }

    #[test]
    fn base_catalog_compiles_cleanly() {
        for seed in BASE_RULES {
            let (id, name, condition_type, operator, threshold, template, icon, priority) = seed;
            let rule = NotificationRule {
                id,
                name: name.to_string(),
                condition_type: condition_type.to_string(),
                operator: operator.to_string(),
                threshold_value: threshold.to_string(),
                message_template: template.to_string(),
                icon: icon.to_string(),
                priority,
                is_active: true,
                created_at: None,
            };
            let condition = Condition::compile(&rule).unwrap();
            assert_ne!(condition, Condition::Never, "rule {} compiled to Never", id);
        }
    }
}
