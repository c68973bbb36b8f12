/// User agent string for HTTP requests
pub const USER_AGENT: &str = "weather-notifier/0.1.0";

/// OpenWeatherMap current weather endpoint
pub const OPENWEATHER_API_BASE: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Hectopascals to millimeters of mercury
pub const HPA_TO_MMHG: f64 = 0.750062;

/// Default location of the history database
pub const DEFAULT_DB_PATH: &str = "data/db/weather.db";

/// Default directory for CSV exports
pub const DEFAULT_EXPORT_DIR: &str = "data/exports";

pub const DEFAULT_CITY: &str = "Moscow";
pub const DEFAULT_LANGUAGE: &str = "ru";
pub const DEFAULT_UNITS: &str = "metric";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
