//! The export pipeline: read each configured counter's recent minutes,
//! average them per configured window, convert units and stage the results
//! for interrogation pick up.

pub mod error;
pub mod task;

use jiff::Span;
use jiff::civil::{DateTime, date};
use tracing::{error, info};

use crate::{
    delivery::{DeliveryBuffer, StagedPoint},
    export::error::ExportError,
    series::{RawSample, SeriesReader, aggregate, error::SeriesError, index},
    store::{ExportConfig, FieldKind, Store},
    units::FlowUnit,
};

/// Each period slot in a config gets its own information object address,
/// `base_ioa` for the first slot, then consecutive.
pub fn ioa_for_period(base_ioa: u32, slot: usize) -> u32 {
    base_ioa + slot as u32
}

/// Outcome of one export cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub processed: usize,
    pub failed: usize,
    pub staged: usize,
}

pub struct Exporter {
    store: Store,
    reader: SeriesReader,
    buffer: DeliveryBuffer,
    lookback_hours: i64,
}

impl Exporter {
    pub fn new(store: Store, lookback_hours: i64) -> Self {
        Self {
            reader: SeriesReader::new(store.clone()),
            buffer: DeliveryBuffer::new(store.clone()),
            store,
            lookback_hours,
        }
    }

    /// Runs one export pass over every enabled config. A failing config is
    /// logged and skipped without blocking the others, and stages nothing.
    pub async fn run_cycle(&self, now: DateTime) -> Result<CycleReport, ExportError> {
        let to = index::floor_minute(now);
        let from = to.saturating_sub(Span::new().hours(self.lookback_hours));
        let configs = self.store.load_enabled_configs().await?;
        info!("exporting {} config(s) over {from}..{to}", configs.len());

        let mut report = CycleReport::default();
        for config in configs {
            match self.run_config(&config, from, to).await {
                Ok(staged) => {
                    report.processed += 1;
                    report.staged += staged;
                }
                Err(err) => {
                    report.failed += 1;
                    error!(
                        "export failed for device {} counter {}: {err}",
                        config.device_id, config.counter_id
                    );
                }
            }
        }
        Ok(report)
    }

    /// Processes one config end to end and stages all of its points in a
    /// single batch, so either every period lands or none does.
    async fn run_config(
        &self,
        config: &ExportConfig,
        from: DateTime,
        to: DateTime,
    ) -> Result<usize, ExportError> {
        let unit: FlowUnit = config.flow_unit.parse()?;
        let samples = self
            .fetch(
                config.device_id,
                config.counter_id,
                FieldKind::Cumulative,
                from,
                to,
            )
            .await?;

        let mut points = Vec::new();
        for (slot, &period) in config.periods.iter().enumerate() {
            let ioa_address = ioa_for_period(config.base_ioa, slot);
            for point in aggregate::aggregate_by_window(&samples, from, to, period)? {
                points.push(StagedPoint {
                    common_address: config.common_address,
                    ioa_address,
                    period_minutes: period,
                    window_start: point.window_start,
                    value: unit.convert(point.average),
                });
            }
        }
        let staged = points.len();
        self.buffer.stage_batch(points).await?;
        Ok(staged)
    }

    /// Extracts `[from, to)`, splitting at January 1 when the range touches
    /// more than one calendar year since minute offsets restart there.
    async fn fetch(
        &self,
        device_id: u32,
        counter_id: u32,
        field: FieldKind,
        from: DateTime,
        to: DateTime,
    ) -> Result<Vec<RawSample>, ExportError> {
        match index::ensure_single_year(from, to) {
            Ok(()) => Ok(self
                .reader
                .extract(device_id, counter_id, field, from, to)
                .await?),
            Err(SeriesError::YearBoundary { .. }) => {
                let mut samples = Vec::new();
                let mut cursor = from;
                while cursor < to {
                    let year_end = date(cursor.year() + 1, 1, 1).at(0, 0, 0, 0);
                    let stop = if year_end < to { year_end } else { to };
                    samples.extend(
                        self.reader
                            .extract(device_id, counter_id, field, cursor, stop)
                            .await?,
                    );
                    cursor = stop;
                }
                Ok(samples)
            }
            Err(err) => Err(err.into()),
        }
    }
}
