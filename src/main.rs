use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::ServiceExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weather_notifier::client::WeatherClient;
use weather_notifier::config::Config;
use weather_notifier::engine::NotificationEngine;
use weather_notifier::error::FetchError;
use weather_notifier::formatters::format_weather;
use weather_notifier::service::Weather;
use weather_notifier::store::Store;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_notifier=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env().context("Configuration error")?;
    let store = Arc::new(
        Store::open(&config.db_path)
            .with_context(|| format!("Failed to open database {}", config.db_path.display()))?,
    );
    let engine = Arc::new(NotificationEngine::new(store));
    let client = WeatherClient::new(&config)?;

    if std::env::args().any(|arg| arg == "--cli") {
        return run_cli(&client, &engine, &config.city).await;
    }

    tracing::info!("Starting MCP weather notifier");

    let weather = Weather::new(client, engine, config.city.clone(), config.export_dir.clone());
    let server = weather.serve(rmcp::transport::stdio()).await?;
    server.waiting().await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// One fetch cycle printed to stdout
async fn run_cli(client: &WeatherClient, engine: &NotificationEngine, city: &str) -> Result<()> {
    println!("🌍 Запрашиваю погоду для {}...", city);

    let (snapshot, elapsed_ms) = match client.fetch_snapshot(city).await {
        Ok(fetched) => fetched,
        Err(e @ FetchError::DataShape(_)) => {
            anyhow::bail!("Ошибка данных: {}", e);
        }
        Err(e) => {
            anyhow::bail!("Ошибка при обращении к серверу погоды: {}", e);
        }
    };

    let (_, notifications) = engine
        .process_weather_data(&snapshot, elapsed_ms)
        .context("Failed to store weather")?;

    print!("{}", format_weather(&snapshot, &notifications));
    Ok(())
}
