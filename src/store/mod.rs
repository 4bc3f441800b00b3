//! SQLite persistence for counters, export configs and the delivery queue.

pub mod error;

use clap_derive::ValueEnum;
use jiff::{Zoned, tz::TimeZone};
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::store::error::StoreError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS counters (
    device_id INTEGER NOT NULL,
    counter_id INTEGER NOT NULL,
    name TEXT,
    raw_data BLOB,
    cumulative_data BLOB,
    active INTEGER NOT NULL DEFAULT 1,
    created TEXT,
    modified TEXT,
    PRIMARY KEY (device_id, counter_id)
);

CREATE TABLE IF NOT EXISTS export_configs (
    device_id INTEGER NOT NULL,
    counter_id INTEGER NOT NULL,
    common_address INTEGER NOT NULL,
    base_ioa INTEGER NOT NULL,
    agg_periods TEXT NOT NULL,
    flow_unit TEXT NOT NULL,
    enabled INTEGER NOT NULL DEFAULT 1,
    PRIMARY KEY (device_id, counter_id)
);

CREATE TABLE IF NOT EXISTS delivery_queue (
    id INTEGER PRIMARY KEY,
    common_address INTEGER NOT NULL,
    ioa_address INTEGER NOT NULL,
    period_minutes INTEGER NOT NULL,
    window_start TEXT NOT NULL,
    value REAL NOT NULL,
    sent_on_gi INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    UNIQUE (common_address, ioa_address, window_start)
);

CREATE INDEX IF NOT EXISTS idx_delivery_pending
    ON delivery_queue (common_address, sent_on_gi, ioa_address, window_start);
";

/// Which of the two per-counter minute records a call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FieldKind {
    /// Instantaneous flow samples.
    Raw,
    /// Meter readings accumulated since installation.
    Cumulative,
}

impl FieldKind {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Raw => "raw_data",
            Self::Cumulative => "cumulative_data",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raw => write!(f, "raw"),
            Self::Cumulative => write!(f, "cumulative"),
        }
    }
}

/// One counter's delivery settings, as stored in `export_configs`.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub device_id: u32,
    pub counter_id: u32,
    pub common_address: u16,
    pub base_ioa: u32,
    pub periods: Vec<i64>,
    pub flow_unit: String,
    pub enabled: bool,
}

impl ExportConfig {
    /// Splits a pipe separated period list, skipping entries that are not integers.
    pub fn parse_periods(raw: &str) -> Vec<i64> {
        raw.split('|')
            .filter_map(|part| part.trim().parse::<i64>().ok())
            .collect()
    }

    fn periods_text(&self) -> String {
        self.periods
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Handle to the backing SQLite database. Cheap to clone.
#[derive(Clone)]
pub struct Store(Connection);

impl Store {
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path.to_string()).await?;
        Self::prepare(conn).await
    }

    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().await?;
        Self::prepare(conn).await
    }

    async fn prepare(conn: Connection) -> Result<Self, StoreError> {
        conn.call(|conn| Ok(conn.execute_batch(SCHEMA)?)).await?;
        Ok(Self(conn))
    }

    pub(crate) async fn call<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<T, tokio_rusqlite::Error> + Send + 'static,
        T: Send + 'static,
    {
        Ok(self.0.call(f).await?)
    }

    pub async fn create_counter(
        &self,
        device_id: u32,
        counter_id: u32,
        name: &str,
    ) -> Result<(), StoreError> {
        let name = name.to_string();
        let created = now_text();
        self.call(move |conn| {
            Ok(conn.execute(
                "INSERT OR IGNORE INTO counters (device_id, counter_id, name, created)
                 VALUES (?1, ?2, ?3, ?4)",
                (device_id, counter_id, name, created),
            )?)
        })
        .await?;
        Ok(())
    }

    /// Reads `len` bytes of one minute record starting at byte `start` (0 based).
    ///
    /// Returns `None` when the counter row is missing or the record was never
    /// written. Reads past the end of the stored blob come back clipped.
    pub async fn read_record_range(
        &self,
        device_id: u32,
        counter_id: u32,
        field: FieldKind,
        start: i64,
        len: i64,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        let sql = format!(
            "SELECT substr({}, ?1, ?2) FROM counters WHERE device_id = ?3 AND counter_id = ?4",
            field.column()
        );
        self.call(move |conn| {
            Ok(conn
                .query_row(&sql, (start + 1, len, device_id, counter_id), |row| {
                    row.get::<_, Option<Vec<u8>>>(0)
                })
                .optional()?
                .flatten())
        })
        .await
    }

    /// Splices `bytes` into one minute record at byte offset `start`, zero
    /// filling the record up to `record_len` first if it is shorter.
    pub async fn write_record_range(
        &self,
        device_id: u32,
        counter_id: u32,
        field: FieldKind,
        start: i64,
        bytes: Vec<u8>,
        record_len: i64,
    ) -> Result<(), StoreError> {
        let column = field.column();
        let select = format!("SELECT {column} FROM counters WHERE device_id = ?1 AND counter_id = ?2");
        let update = format!(
            "UPDATE counters SET {column} = ?1, modified = ?2 WHERE device_id = ?3 AND counter_id = ?4"
        );
        let modified = now_text();
        let found = self
            .call(move |conn| {
                let tx = conn.transaction()?;
                let Some(existing) = tx
                    .query_row(&select, (device_id, counter_id), |row| {
                        row.get::<_, Option<Vec<u8>>>(0)
                    })
                    .optional()?
                else {
                    return Ok(false);
                };
                let start = start as usize;
                let mut record = existing.unwrap_or_default();
                let needed = (record_len as usize).max(start + bytes.len());
                if record.len() < needed {
                    record.resize(needed, 0);
                }
                record[start..start + bytes.len()].copy_from_slice(&bytes);
                tx.execute(&update, (record, modified, device_id, counter_id))?;
                tx.commit()?;
                Ok(true)
            })
            .await?;
        if !found {
            return Err(StoreError::CounterNotFound {
                device_id,
                counter_id,
            });
        }
        Ok(())
    }

    /// Replaces one minute record wholesale.
    pub async fn put_record(
        &self,
        device_id: u32,
        counter_id: u32,
        field: FieldKind,
        bytes: Vec<u8>,
    ) -> Result<(), StoreError> {
        let sql = format!(
            "UPDATE counters SET {} = ?1, modified = ?2 WHERE device_id = ?3 AND counter_id = ?4",
            field.column()
        );
        let modified = now_text();
        let updated = self
            .call(move |conn| Ok(conn.execute(&sql, (bytes, modified, device_id, counter_id))?))
            .await?;
        if updated == 0 {
            return Err(StoreError::CounterNotFound {
                device_id,
                counter_id,
            });
        }
        Ok(())
    }

    pub async fn upsert_export_config(&self, config: ExportConfig) -> Result<(), StoreError> {
        let periods = config.periods_text();
        self.call(move |conn| {
            Ok(conn.execute(
                "INSERT INTO export_configs
                     (device_id, counter_id, common_address, base_ioa, agg_periods, flow_unit, enabled)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT (device_id, counter_id) DO UPDATE SET
                     common_address = excluded.common_address,
                     base_ioa = excluded.base_ioa,
                     agg_periods = excluded.agg_periods,
                     flow_unit = excluded.flow_unit,
                     enabled = excluded.enabled",
                (
                    config.device_id,
                    config.counter_id,
                    config.common_address,
                    config.base_ioa,
                    periods,
                    config.flow_unit,
                    config.enabled,
                ),
            )?)
        })
        .await?;
        Ok(())
    }

    pub async fn load_enabled_configs(&self) -> Result<Vec<ExportConfig>, StoreError> {
        self.call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT device_id, counter_id, common_address, base_ioa, agg_periods, flow_unit, enabled
                 FROM export_configs WHERE enabled = 1
                 ORDER BY device_id ASC, counter_id ASC",
            )?;
            let configs = stmt
                .query_map((), |row| {
                    Ok(ExportConfig {
                        device_id: row.get(0)?,
                        counter_id: row.get(1)?,
                        common_address: row.get(2)?,
                        base_ioa: row.get(3)?,
                        periods: ExportConfig::parse_periods(&row.get::<_, String>(4)?),
                        flow_unit: row.get(5)?,
                        enabled: row.get(6)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(configs)
        })
        .await
    }
}

pub(crate) fn now_text() -> String {
    Zoned::now().with_time_zone(TimeZone::UTC).datetime().to_string()
}
