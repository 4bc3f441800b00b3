//! Delivery queue for aggregated points awaiting a general interrogation.
//!
//! A point is identified by `(common_address, ioa_address, window_start)`.
//! Staging the same identity again refreshes the pending row; once a row is
//! acknowledged it is final and later stagings of that identity are dropped.

pub mod error;

use jiff::civil::DateTime;

use crate::{
    delivery::error::DeliveryError,
    store::{Store, now_text},
};

const UPSERT: &str = "
INSERT INTO delivery_queue
    (common_address, ioa_address, period_minutes, window_start, value, sent_on_gi, created_at)
VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)
ON CONFLICT (common_address, ioa_address, window_start) DO UPDATE SET
    period_minutes = excluded.period_minutes,
    value = excluded.value,
    created_at = excluded.created_at
WHERE sent_on_gi = 0";

/// A value staged for delivery, identified by where and when it applies.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedPoint {
    pub common_address: u16,
    pub ioa_address: u32,
    pub period_minutes: i64,
    pub window_start: DateTime,
    pub value: f64,
}

/// A queue row as read back for an interrogation.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryRecord {
    pub id: i64,
    pub common_address: u16,
    pub ioa_address: u32,
    pub period_minutes: i64,
    pub window_start: DateTime,
    pub value: f64,
    pub sent_on_gi: bool,
}

#[derive(Clone)]
pub struct DeliveryBuffer {
    store: Store,
}

impl DeliveryBuffer {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn stage(&self, point: StagedPoint) -> Result<(), DeliveryError> {
        self.stage_batch(vec![point]).await
    }

    /// Stages a whole batch in one transaction, so a failure partway leaves
    /// the queue untouched.
    pub async fn stage_batch(&self, points: Vec<StagedPoint>) -> Result<(), DeliveryError> {
        let created_at = now_text();
        self.store
            .call(move |conn| {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(UPSERT)?;
                    for point in &points {
                        stmt.execute((
                            point.common_address,
                            point.ioa_address,
                            point.period_minutes,
                            point.window_start.to_string(),
                            point.value,
                            &created_at,
                        ))?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Every pending point for one common address, ordered by information
    /// object address, then window start.
    pub async fn pull_unacknowledged(
        &self,
        common_address: u16,
    ) -> Result<Vec<DeliveryRecord>, DeliveryError> {
        let records = self
            .store
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, common_address, ioa_address, period_minutes, window_start, value, sent_on_gi
                     FROM delivery_queue
                     WHERE common_address = ?1 AND sent_on_gi = 0
                     ORDER BY ioa_address ASC, window_start ASC",
                )?;
                let records = stmt
                    .query_map((common_address,), row_to_record)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await?;
        Ok(records)
    }

    /// Marks the given rows acknowledged, skipping any a concurrent
    /// interrogation already flipped. Returns how many rows this call
    /// actually flipped.
    pub async fn acknowledge(&self, ids: Vec<i64>) -> Result<usize, DeliveryError> {
        let flipped = self
            .store
            .call(move |conn| {
                let tx = conn.transaction()?;
                let mut flipped = 0;
                {
                    let mut stmt = tx.prepare(
                        "UPDATE delivery_queue SET sent_on_gi = 1 WHERE id = ?1 AND sent_on_gi = 0",
                    )?;
                    for id in ids {
                        flipped += stmt.execute((id,))?;
                    }
                }
                tx.commit()?;
                Ok(flipped)
            })
            .await?;
        Ok(flipped)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<DeliveryRecord> {
    let text: String = row.get(4)?;
    let window_start: DateTime = text.parse().map_err(|err: jiff::Error| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(err))
    })?;
    Ok(DeliveryRecord {
        id: row.get(0)?,
        common_address: row.get(1)?,
        ioa_address: row.get(2)?,
        period_minutes: row.get(3)?,
        window_start,
        value: row.get(5)?,
        sent_on_gi: row.get(6)?,
    })
}
