use std::path::PathBuf;
use std::sync::Arc;

use rmcp::{
    handler::server::{wrapper::Parameters, ServerHandler, tool::ToolRouter},
    model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
    ErrorData as McpError,
};

use crate::client::WeatherClient;
use crate::engine::NotificationEngine;
use crate::error::{ExportError, FetchError, StoreError};
use crate::export::export_history_csv;
use crate::formatters::{format_history, format_rules, format_weather};
use crate::models::{
    ExportHistoryRequest, GetHistoryRequest, GetWeatherRequest, SaveRuleRequest,
    SetRuleActiveRequest,
};
use crate::rules::Condition;

const DEFAULT_HISTORY_LIMIT: usize = 5;

/// MCP front end over the notification engine
#[derive(Clone)]
pub struct Weather {
    client: WeatherClient,
    engine: Arc<NotificationEngine>,
    default_city: String,
    export_dir: PathBuf,
    tool_router: ToolRouter<Self>,
}

impl Weather {
    pub fn new(
        client: WeatherClient,
        engine: Arc<NotificationEngine>,
        default_city: String,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            client,
            engine,
            default_city,
            export_dir,
            tool_router: Self::tool_router(),
        }
    }

    /// Runs store work on the blocking pool
    async fn with_engine<F, T>(&self, f: F) -> Result<T, McpError>
    where
        F: FnOnce(&NotificationEngine) -> T + Send + 'static,
        T: Send + 'static,
    {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || f(&engine))
            .await
            .map_err(|e| McpError::internal_error(format!("Store task failed: {}", e), None))
    }

    /// Fetches one snapshot and hands it to the engine
    async fn fetch_and_process(&self, city: String) -> Result<String, McpError> {
        let (snapshot, elapsed_ms) = self.client.fetch_snapshot(&city).await.map_err(|e| match e {
            FetchError::Status(status) if status == reqwest::StatusCode::NOT_FOUND => {
                McpError::invalid_params(format!("City not found: {}", city), None)
            }
            other => McpError::internal_error(format!("Failed to fetch weather: {}", other), None),
        })?;

        let processed = snapshot.clone();
        let (_, notifications) = self
            .with_engine(move |engine| engine.process_weather_data(&processed, elapsed_ms))
            .await?
            .map_err(|e| McpError::internal_error(format!("Failed to store weather: {}", e), None))?;

        Ok(format_weather(&snapshot, &notifications))
    }
}

#[tool_handler]
impl ServerHandler for Weather {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "weather-notifier".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                title: None,
                website_url: None,
            },
            instructions: Some(
                "Current weather from OpenWeatherMap with rule-based recommendations. \
                Every lookup is stored in a local history."
                    .to_string(),
            ),
        }
    }
}

#[tool_router]
impl Weather {
    /// Fetches current weather and evaluates notification rules
    #[tool(description = "Get current weather for a city together with recommendations (e.g., take an umbrella, dress warmly). Omit 'city' to use the configured default city.")]
    async fn get_weather(
        &self,
        Parameters(request): Parameters<GetWeatherRequest>,
    ) -> Result<CallToolResult, McpError> {
        let city = request
            .city
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| self.default_city.clone());
        tracing::info!("Getting weather for city: {}", city);

        let formatted = self.fetch_and_process(city).await?;

        Ok(CallToolResult::success(vec![Content::text(formatted)]))
    }

    /// Lists stored weather lookups
    #[tool(description = "Show the history of weather lookups, newest first. 'limit' caps the number of entries (0 = all, default 5).")]
    async fn get_history(
        &self,
        Parameters(request): Parameters<GetHistoryRequest>,
    ) -> Result<CallToolResult, McpError> {
        let limit = request.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);

        let formatted = self
            .with_engine(move |engine| -> Result<String, StoreError> {
                let store = engine.store();
                let records = store.get_recent_records(limit)?;
                let total = store.get_record_count()?;
                Ok(format_history(&records, total))
            })
            .await?
            .map_err(|e| McpError::internal_error(format!("Failed to read history: {}", e), None))?;

        Ok(CallToolResult::success(vec![Content::text(formatted)]))
    }

    /// Notifications issued for the latest lookup
    #[tool(description = "Show the recommendations issued for the most recent weather lookup.")]
    async fn get_notifications(&self) -> Result<CallToolResult, McpError> {
        let messages = self
            .with_engine(|engine| engine.get_recent_notifications(1))
            .await?
            .map_err(|e| McpError::internal_error(format!("Failed to read notifications: {}", e), None))?;

        let text = if messages.is_empty() {
            "No notifications for the latest lookup.".to_string()
        } else {
            messages
                .iter()
                .enumerate()
                .map(|(i, m)| format!("{}. {}", i + 1, m))
                .collect::<Vec<_>>()
                .join("\n")
        };

        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Deletes all stored lookups and their notifications
    #[tool(description = "Delete the whole weather lookup history, including issued recommendations.")]
    async fn clear_history(&self) -> Result<CallToolResult, McpError> {
        tracing::info!("Clearing weather history");

        if self.with_engine(|engine| engine.store().clear_history()).await? {
            Ok(CallToolResult::success(vec![Content::text("History cleared.")]))
        } else {
            Ok(CallToolResult::error(vec![Content::text("Failed to clear history.")]))
        }
    }

    /// Writes the history to a CSV file
    #[tool(description = "Export the whole weather lookup history to a CSV file in the export directory. Optionally provide a file name.")]
    async fn export_history(
        &self,
        Parameters(request): Parameters<ExportHistoryRequest>,
    ) -> Result<CallToolResult, McpError> {
        let dir = self.export_dir.clone();
        let exported = self
            .with_engine(move |engine| {
                export_history_csv(engine.store(), &dir, request.filename.as_deref())
            })
            .await?;

        match exported {
            Ok(path) => Ok(CallToolResult::success(vec![Content::text(format!(
                "History exported to {}",
                path.display()
            ))])),
            Err(ExportError::Empty) => Ok(CallToolResult::error(vec![Content::text(
                "No history to export.",
            )])),
            Err(e) => Err(McpError::internal_error(format!("Export failed: {}", e), None)),
        }
    }

    /// Lists every notification rule
    #[tool(description = "List all notification rules with their condition, threshold, priority and whether they are active.")]
    async fn list_rules(&self) -> Result<CallToolResult, McpError> {
        let rules = self
            .with_engine(|engine| engine.store().get_notification_rules())
            .await?
            .map_err(|e| McpError::internal_error(format!("Failed to read rules: {}", e), None))?;

        Ok(CallToolResult::success(vec![Content::text(format_rules(&rules))]))
    }

    /// Enables or disables one rule
    #[tool(description = "Enable or disable a notification rule by id.")]
    async fn set_rule_active(
        &self,
        Parameters(request): Parameters<SetRuleActiveRequest>,
    ) -> Result<CallToolResult, McpError> {
        let SetRuleActiveRequest { rule_id, active } = request;
        tracing::info!("Setting rule {} active = {}", rule_id, active);

        let found = self
            .with_engine(move |engine| engine.store().set_rule_active(rule_id, active))
            .await?
            .map_err(|e| McpError::internal_error(format!("Failed to update rule: {}", e), None))?;

        if !found {
            return Err(McpError::invalid_params(format!("Rule {} not found", rule_id), None));
        }
        let state = if active { "enabled" } else { "disabled" };
        Ok(CallToolResult::success(vec![Content::text(format!("Rule {} {}.", rule_id, state))]))
    }

    /// Adds a rule or replaces an existing one
    #[tool(description = "Create or update a notification rule. The threshold is checked against the condition type before saving.")]
    async fn save_rule(
        &self,
        Parameters(request): Parameters<SaveRuleRequest>,
    ) -> Result<CallToolResult, McpError> {
        let rule = request.into_rule();
        Condition::compile(&rule).map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        tracing::info!("Saving rule {} '{}'", rule.id, rule.name);

        let id = self
            .with_engine(move |engine| engine.store().save_notification_rule(&rule))
            .await?
            .map_err(|e| McpError::internal_error(format!("Failed to save rule: {}", e), None))?;

        Ok(CallToolResult::success(vec![Content::text(format!("Rule {} saved.", id))]))
    }
}
