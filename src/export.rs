//! CSV export of the weather history.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use crate::error::ExportError;
use crate::evaluator::hpa_to_mmhg;
use crate::store::Store;

const HEADER: [&str; 12] = [
    "ID",
    "Город",
    "Время",
    "Температура (°C)",
    "Ощущается как (°C)",
    "Влажность (%)",
    "Давление (гПа)",
    "Давление (мм рт.ст.)",
    "Описание",
    "Скорость ветра (м/с)",
    "Время ответа (мс)",
    "Дата создания",
];

pub fn default_file_name() -> String {
    format!("weather_history_{}.csv", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Writes every stored record to `dir/file_name` and returns the written path.
pub fn export_history_csv(
    store: &Store,
    dir: &Path,
    file_name: Option<&str>,
) -> Result<PathBuf, ExportError> {
    let records = store.get_recent_records(0)?;
    if records.is_empty() {
        return Err(ExportError::Empty);
    }

    std::fs::create_dir_all(dir)?;
    // Only the final path component is used so names cannot escape `dir`.
    let name = file_name
        .and_then(|n| Path::new(n).file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(default_file_name);
    let path = dir.join(name);

    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(HEADER)?;

    for record in &records {
        writer.write_record([
            record.id.map(|id| id.to_string()).unwrap_or_default(),
            record.city.clone(),
            fmt_time(record.timestamp),
            format!("{:.1}", record.temperature),
            format!("{:.1}", record.feels_like),
            record.humidity.to_string(),
            record.pressure.to_string(),
            hpa_to_mmhg(record.pressure).to_string(),
            record.description.clone(),
            format!("{:.1}", record.wind_speed),
            record.response_time_ms.to_string(),
            fmt_time(record.created_at),
        ])?;
    }
    writer.flush()?;

    tracing::info!("Exported {} records to {}", records.len(), path.display());
    Ok(path)
}

fn fmt_time(ts: Option<NaiveDateTime>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeatherRecord;

    fn record(city: &str) -> WeatherRecord {
        WeatherRecord {
            id: None,
            city: city.to_string(),
            timestamp: None,
            temperature: 21.0,
            feels_like: 20.5,
            humidity: 45,
            pressure: 1013,
            description: "ясно, тепло".to_string(),
            wind_speed: 1.5,
            response_time_ms: 120,
            created_at: None,
        }
    }

    #[test]
    fn empty_history_is_not_exported() {
        let store = Store::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = export_history_csv(&store, dir.path(), None).unwrap_err();
        assert!(matches!(err, ExportError::Empty));
    }

    #[test]
    fn writes_header_and_rows() {
        let store = Store::open_in_memory().unwrap();
        store.save_weather_record(&record("Москва")).unwrap();
        store.save_weather_record(&record("Казань")).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let path = export_history_csv(&store, dir.path(), Some("../out.csv")).unwrap();
        assert_eq!(path, dir.path().join("out.csv"));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.headers().unwrap().len(), HEADER.len());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "Казань");
        assert_eq!(&rows[0][7], "760");
        assert_eq!(&rows[0][8], "ясно, тепло");
        assert_eq!(&rows[0][10], "120");
    }

    #[test]
    fn default_name_has_timestamp() {
        let name = default_file_name();
        assert!(name.starts_with("weather_history_"));
        assert!(name.ends_with(".csv"));
    }
}
