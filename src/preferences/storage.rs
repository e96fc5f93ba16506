//! Key/value preference storage using SQLite.

use super::{OverlayCalibration, OverlayMap, OVERLAYS_KEY};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Preference storage backed by SQLite.
///
/// # Schema
/// ```sql
/// CREATE TABLE preferences (
///     key TEXT PRIMARY KEY,
///     value TEXT NOT NULL,      -- JSON
///     updated_at TEXT NOT NULL  -- ISO 8601 timestamp
/// );
/// ```
pub struct PreferenceStore {
    conn: Mutex<Connection>,
}

impl PreferenceStore {
    /// Creates or opens a preference store at `db_path`.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path).context("Failed to open preferences database")?;
        Self::init(conn)
    }

    /// Store that lives only as long as the process
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )
        .context("Failed to create preferences table")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Preference store lock poisoned"))
    }

    /// Raw stored value for `key`
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT value FROM preferences WHERE key = ?1")
            .context("Failed to prepare query")?;

        let mut rows = stmt.query(params![key]).context("Failed to execute query")?;
        let value: Option<String> = match rows.next().context("Failed to read row")? {
            Some(row) => Some(row.get(0)?),
            None => None,
        };
        Ok(value)
    }

    /// Insert or replace the value for `key`
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.lock()?
            .execute(
                r#"
                INSERT INTO preferences (key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
                params![key, value, now],
            )
            .context("Failed to store preference")?;
        Ok(())
    }

    /// Returns true if a value was removed
    pub fn remove(&self, key: &str) -> Result<bool> {
        let rows_affected = self
            .lock()?
            .execute("DELETE FROM preferences WHERE key = ?1", params![key])
            .context("Failed to delete preference")?;
        Ok(rows_affected > 0)
    }

    /// Saved overlay calibrations. A missing or unreadable value yields an
    /// empty map.
    pub fn load_overlays(&self) -> Result<OverlayMap> {
        let Some(raw) = self.get(OVERLAYS_KEY)? else {
            return Ok(OverlayMap::new());
        };

        match serde_json::from_str::<OverlayMap>(&raw) {
            Ok(overlays) => {
                debug!(floors = overlays.len(), "Loaded overlay calibrations");
                Ok(overlays)
            }
            Err(e) => {
                warn!(error = %e, "Stored overlay calibrations are corrupt, ignoring");
                Ok(OverlayMap::new())
            }
        }
    }

    /// Persist overlay calibrations. An empty map removes the stored value.
    pub fn save_overlays(&self, overlays: &OverlayMap) -> Result<()> {
        if overlays.is_empty() {
            self.remove(OVERLAYS_KEY)?;
            return Ok(());
        }

        let raw = serde_json::to_string(overlays).context("Failed to encode overlays")?;
        self.set(OVERLAYS_KEY, &raw)
    }

    /// Set the calibration for one floor, keeping the others
    pub fn set_overlay(&self, floor: i32, overlay: OverlayCalibration) -> Result<()> {
        let mut overlays = self.load_overlays()?;
        overlays.insert(floor, overlay);
        self.save_overlays(&overlays)
    }

    /// Drop the calibration for one floor. Returns true if it existed.
    pub fn remove_overlay(&self, floor: i32) -> Result<bool> {
        let mut overlays = self.load_overlays()?;
        let removed = overlays.remove(&floor).is_some();
        if removed {
            self.save_overlays(&overlays)?;
        }
        Ok(removed)
    }
}
