//! SQLite persistence for weather history, notification rules and issued notifications.

use std::path::Path;
use std::sync::Mutex;

use chrono::{NaiveDateTime, Utc};
use rusqlite::{ffi, params, Connection, Row, Transaction};

use crate::error::StoreError;
use crate::models::{IssuedNotification, NotificationRule, WeatherRecord};
use crate::rules::BASE_RULES;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS weather_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        city TEXT NOT NULL,
        timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
        temperature REAL NOT NULL,
        feels_like REAL NOT NULL,
        humidity INTEGER NOT NULL,
        pressure INTEGER NOT NULL,
        description TEXT NOT NULL,
        wind_speed REAL NOT NULL,
        response_time_ms INTEGER DEFAULT 0,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS notification_rules (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        condition_type TEXT NOT NULL,
        operator TEXT NOT NULL,
        threshold_value TEXT NOT NULL,
        message_template TEXT NOT NULL,
        icon TEXT,
        priority INTEGER DEFAULT 1,
        is_active BOOLEAN DEFAULT 1,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS issued_notifications (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        history_id INTEGER NOT NULL,
        rule_id INTEGER NOT NULL,
        message TEXT NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (history_id) REFERENCES weather_history(id) ON DELETE CASCADE,
        FOREIGN KEY (rule_id) REFERENCES notification_rules(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_weather_history_timestamp ON weather_history(timestamp);
    CREATE INDEX IF NOT EXISTS idx_weather_history_city ON weather_history(city);
    CREATE INDEX IF NOT EXISTS idx_notification_rules_active ON notification_rules(is_active, priority);
    CREATE INDEX IF NOT EXISTS idx_issued_notifications_history ON issued_notifications(history_id);
";

/// Single-connection store. One instance per process, shared by reference.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Opens (creating if needed) the database file and initializes it.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    /// Opens an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize()?;
        Ok(store)
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError>,
    {
        let mut guard = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&mut guard)
    }

    /// Runs `f` in a transaction. Dropping the transaction on error rolls it back.
    fn with_transaction<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, StoreError>,
    {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let out = f(&tx)?;
            tx.commit()?;
            Ok(out)
        })
    }

    /// Creates tables and indexes, and seeds the rule catalog. Safe to call repeatedly.
    pub fn initialize(&self) -> Result<(), StoreError> {
        self.with_transaction(|tx| {
            tx.execute_batch(SCHEMA)?;
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO notification_rules
                 (id, name, condition_type, operator, threshold_value, message_template, icon, priority)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            let mut seeded = 0;
            for (id, name, condition_type, operator, threshold, template, icon, priority) in BASE_RULES {
                seeded += stmt.execute(params![
                    id,
                    name,
                    condition_type,
                    operator,
                    threshold,
                    template,
                    icon,
                    priority
                ])?;
            }
            if seeded > 0 {
                tracing::info!("Seeded {} notification rules", seeded);
            }
            Ok(())
        })
    }

    pub fn save_weather_record(&self, record: &WeatherRecord) -> Result<i64, StoreError> {
        let timestamp = record
            .timestamp
            .unwrap_or_else(|| Utc::now().naive_utc());
        self.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO weather_history
                 (city, timestamp, temperature, feels_like, humidity, pressure,
                  description, wind_speed, response_time_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.city,
                    timestamp,
                    record.temperature,
                    record.feels_like,
                    record.humidity,
                    record.pressure,
                    record.description,
                    record.wind_speed,
                    record.response_time_ms.max(0),
                ],
            )?;
            Ok(tx.last_insert_rowid())
        })
    }

    /// Newest first. `limit == 0` returns every record.
    pub fn get_recent_records(&self, limit: usize) -> Result<Vec<WeatherRecord>, StoreError> {
        let limit = if limit == 0 { -1 } else { limit as i64 };
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT id, city, timestamp, temperature, feels_like, humidity, pressure,
                        description, wind_speed, response_time_ms, created_at
                 FROM weather_history
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], weather_record_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    /// Active rules ordered by priority, then id.
    pub fn get_active_notification_rules(&self) -> Result<Vec<NotificationRule>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT id, name, condition_type, operator, threshold_value, message_template,
                        icon, priority, is_active, created_at
                 FROM notification_rules
                 WHERE is_active = 1
                 ORDER BY priority, id",
            )?;
            let rows = stmt.query_map([], notification_rule_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    /// Every rule, active or not, ordered by priority, then id.
    pub fn get_notification_rules(&self) -> Result<Vec<NotificationRule>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT id, name, condition_type, operator, threshold_value, message_template,
                        icon, priority, is_active, created_at
                 FROM notification_rules
                 ORDER BY priority, id",
            )?;
            let rows = stmt.query_map([], notification_rule_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    /// Inserts a rule, or updates the existing rule with the same id.
    pub fn save_notification_rule(&self, rule: &NotificationRule) -> Result<i64, StoreError> {
        self.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO notification_rules
                 (id, name, condition_type, operator, threshold_value, message_template,
                  icon, priority, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    condition_type = excluded.condition_type,
                    operator = excluded.operator,
                    threshold_value = excluded.threshold_value,
                    message_template = excluded.message_template,
                    icon = excluded.icon,
                    priority = excluded.priority,
                    is_active = excluded.is_active",
                params![
                    rule.id,
                    rule.name,
                    rule.condition_type,
                    rule.operator,
                    rule.threshold_value,
                    rule.message_template,
                    rule.icon,
                    rule.priority,
                    rule.is_active
                ],
            )?;
            Ok(rule.id)
        })
    }

    /// Returns `false` if no rule has that id.
    pub fn set_rule_active(&self, rule_id: i64, active: bool) -> Result<bool, StoreError> {
        self.with_transaction(|tx| {
            let changed = tx.execute(
                "UPDATE notification_rules SET is_active = ?1 WHERE id = ?2",
                params![active, rule_id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Fails with [`StoreError::Referential`] if the record or rule does not exist.
    pub fn save_issued_notification(
        &self,
        notification: &IssuedNotification,
    ) -> Result<i64, StoreError> {
        self.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO issued_notifications (history_id, rule_id, message)
                 VALUES (?1, ?2, ?3)",
                params![
                    notification.history_id,
                    notification.rule_id,
                    notification.message
                ],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(ref err, _)
                    if err.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
                {
                    StoreError::Referential(format!(
                        "history_id {} / rule_id {}",
                        notification.history_id, notification.rule_id
                    ))
                }
                other => other.into(),
            })?;
            Ok(tx.last_insert_rowid())
        })
    }

    /// Notifications for one record, ordered by rule priority then creation time.
    pub fn get_notifications_for_record(
        &self,
        history_id: i64,
    ) -> Result<Vec<IssuedNotification>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT inot.id, inot.history_id, inot.rule_id, inot.message, inot.created_at
                 FROM issued_notifications inot
                 JOIN notification_rules nr ON inot.rule_id = nr.id
                 WHERE inot.history_id = ?1
                 ORDER BY nr.priority, inot.created_at, inot.id",
            )?;
            let rows = stmt.query_map(params![history_id], |row| {
                Ok(IssuedNotification {
                    id: row.get(0)?,
                    history_id: row.get(1)?,
                    rule_id: row.get(2)?,
                    message: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    pub fn get_record_count(&self) -> Result<i64, StoreError> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM weather_history", [], |row| row.get(0))?)
        })
    }

    /// Deletes all notifications and records, then reclaims space.
    /// Failures are logged and reported as `false`.
    pub fn clear_history(&self) -> bool {
        let result = self
            .with_transaction(|tx| {
                let notifications = tx.execute("DELETE FROM issued_notifications", [])?;
                let records = tx.execute("DELETE FROM weather_history", [])?;
                Ok((notifications, records))
            })
            .and_then(|counts| {
                // VACUUM cannot run inside a transaction.
                self.with_conn(|conn| Ok(conn.execute_batch("VACUUM")?))?;
                Ok(counts)
            });

        match result {
            Ok((notifications, records)) => {
                tracing::info!(
                    "Cleared history: {} records, {} notifications",
                    records,
                    notifications
                );
                true
            }
            Err(e) => {
                tracing::error!("Failed to clear history: {}", e);
                false
            }
        }
    }
}

fn notification_rule_from_row(row: &Row<'_>) -> rusqlite::Result<NotificationRule> {
    Ok(NotificationRule {
        id: row.get(0)?,
        name: row.get(1)?,
        condition_type: row.get(2)?,
        operator: row.get(3)?,
        threshold_value: row.get(4)?,
        message_template: row.get(5)?,
        icon: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        priority: row.get(7)?,
        is_active: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn weather_record_from_row(row: &Row<'_>) -> rusqlite::Result<WeatherRecord> {
    Ok(WeatherRecord {
        id: row.get(0)?,
        city: row.get(1)?,
        timestamp: row.get::<_, Option<NaiveDateTime>>(2)?,
        temperature: row.get(3)?,
        feels_like: row.get(4)?,
        humidity: row.get(5)?,
        pressure: row.get(6)?,
        description: row.get(7)?,
        wind_speed: row.get(8)?,
        response_time_ms: row.get::<_, Option<i64>>(9)?.unwrap_or(0),
        created_at: row.get(10)?,
    })
}
