use crate::evaluator::hpa_to_mmhg;
use crate::models::{NotificationRule, WeatherRecord, WeatherSnapshot};

/// Formats a snapshot and its notifications into a human-readable report
pub fn format_weather(snapshot: &WeatherSnapshot, notifications: &[String]) -> String {
    let rule = "=".repeat(50);
    let mut output = format!(
        "🌤 ПОГОДА В ГОРОДЕ {}\n{}\n🌡️ Температура:     {:.1}°C\n🤔 Ощущается как:   {:.1}°C\n💧 Влажность:       {}%\n📊 Давление:        {} мм рт. ст. ({} гПа)\n☁️ Описание:        {}\n💨 Скорость ветра:  {:.1} м/с\n{}\n",
        snapshot.city.to_uppercase(),
        rule,
        snapshot.temperature,
        snapshot.feels_like,
        snapshot.humidity,
        hpa_to_mmhg(snapshot.pressure),
        snapshot.pressure,
        snapshot.description,
        snapshot.wind_speed,
        rule,
    );

    if !notifications.is_empty() {
        output.push_str(&format!(
            "\n🔔 АКТИВНЫЕ РЕКОМЕНДАЦИИ ({}):\n{}\n",
            notifications.len(),
            "-".repeat(50)
        ));
        for (i, notification) in notifications.iter().enumerate() {
            output.push_str(&format!("  {}. {}\n", i + 1, notification));
        }
    }
    output
}

/// Formats one history entry as `time | temperature | description`
pub fn format_history_line(record: &WeatherRecord) -> String {
    let time = record
        .timestamp
        .map(|ts| ts.format("%d.%m %H:%M").to_string())
        .unwrap_or_else(|| "Н/Д".to_string());

    let temp_icon = if record.temperature < 0.0 {
        "🔵 "
    } else if record.temperature > 25.0 {
        "🔴 "
    } else {
        ""
    };

    format!(
        "{} | {}{:+.1}°C | {} {}",
        time,
        temp_icon,
        record.temperature,
        weather_icon(&record.description),
        record.description
    )
}

/// Formats the history list, newest first
pub fn format_history(records: &[WeatherRecord], total: i64) -> String {
    if records.is_empty() {
        return "История запросов пуста.".to_string();
    }

    let mut output = format!("История запросов ({} из {}):\n\n", records.len(), total);
    for record in records {
        output.push_str(&format_history_line(record));
        output.push('\n');
    }
    output
}

/// Formats the rule catalog, one rule per line
pub fn format_rules(rules: &[NotificationRule]) -> String {
    if rules.is_empty() {
        return "No notification rules.".to_string();
    }

    let mut output = String::from("Notification rules:\n\n");
    for rule in rules {
        output.push_str(&format!(
            "#{} [priority {}] {} {}: {} {} {}{}\n",
            rule.id,
            rule.priority,
            rule.icon,
            rule.name,
            rule.condition_type,
            rule.operator,
            rule.threshold_value,
            if rule.is_active { "" } else { " (off)" }
        ));
    }
    output
}

/// Picks an icon for a weather description by keyword
fn weather_icon(description: &str) -> &'static str {
    let desc = description.to_lowercase();

    if desc.contains("ясно") || desc.contains("солнечно") {
        "☀️"
    } else if desc.contains("облачно") {
        "☁️"
    } else if desc.contains("дождь") {
        if desc.contains("ливень") || desc.contains("сильный") {
            "🌧️"
        } else {
            "🌦️"
        }
    } else if desc.contains("снег") {
        "❄️"
    } else if desc.contains("туман") {
        "🌫️"
    } else if desc.contains("гроз") {
        "⛈️"
    } else if desc.contains("ветер") {
        "💨"
    } else if desc.contains("пасмурно") {
        "☁️"
    } else {
        "🌤️"
    }
}
