//! Evaluates active rules for one snapshot and records what fired.

use std::sync::Arc;

use crate::error::StoreError;
use crate::evaluator::format_message;
use crate::models::{IssuedNotification, WeatherRecord, WeatherSnapshot};
use crate::rules::Condition;
use crate::store::Store;

pub struct NotificationEngine {
    store: Arc<Store>,
}

impl NotificationEngine {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Persists the snapshot, evaluates every active rule in priority order and
    /// stores each fired notification.
    ///
    /// Returns the new record id and the rendered messages in rule-priority order.
    /// A rule that cannot be evaluated is logged and skipped.
    pub fn process_weather_data(
        &self,
        snapshot: &WeatherSnapshot,
        response_time_ms: u64,
    ) -> Result<(i64, Vec<String>), StoreError> {
        let record = WeatherRecord::from_snapshot(snapshot, response_time_ms);
        let history_id = self.store.save_weather_record(&record)?;

        let rules = self.store.get_active_notification_rules()?;
        let mut messages = Vec::new();

        for rule in &rules {
            let condition = match Condition::compile(rule) {
                Ok(condition) => condition,
                Err(e) => {
                    tracing::warn!("Skipping rule '{}': {}", rule.name, e);
                    continue;
                }
            };

            if !condition.matches(snapshot) {
                continue;
            }

            let message = format_message(rule, snapshot);
            self.store
                .save_issued_notification(&IssuedNotification::new(history_id, rule.id, &message))?;
            messages.push(message);
        }

        tracing::info!(
            "Processed weather for {}: record {}, {} of {} rules fired ({} ms)",
            snapshot.city,
            history_id,
            messages.len(),
            rules.len(),
            response_time_ms
        );

        Ok((history_id, messages))
    }

    /// Messages stored for the most recent record only. `limit` bounds the
    /// records considered; the newest one is used.
    pub fn get_recent_notifications(&self, limit: usize) -> Result<Vec<String>, StoreError> {
        let records = self.store.get_recent_records(limit)?;
        let Some(latest) = records.first().and_then(|r| r.id) else {
            return Ok(Vec::new());
        };

        Ok(self
            .store
            .get_notifications_for_record(latest)?
            .into_iter()
            .map(|n| n.message)
            .collect())
    }
}
