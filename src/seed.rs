//! Demo data: one counter with its export config and a day of constant flow
//! ending at the current minute.

use jiff::civil::{DateTime, date};
use jiff::{Span, Zoned};
use tracing::info;

use crate::{
    series::{encode_samples, index},
    store::{ExportConfig, FieldKind, Store, error::StoreError},
};

const DEVICE_ID: u32 = 1;
const COUNTER_ID: u32 = 135;
const FLOW_VALUE: u16 = 500;
const HOURS: i64 = 24;

/// Inserts the demo counter and config, then writes the trailing 24 hours of
/// both minute records at a constant 500 l/min. Safe to run repeatedly.
pub async fn run(store: &Store) -> Result<(), StoreError> {
    store
        .create_counter(DEVICE_ID, COUNTER_ID, "demo counter")
        .await?;
    store
        .upsert_export_config(ExportConfig {
            device_id: DEVICE_ID,
            counter_id: COUNTER_ID,
            common_address: 100,
            base_ioa: 5000,
            periods: vec![3, 15, 60],
            flow_unit: "m3/h".to_string(),
            enabled: true,
        })
        .await?;

    let to = index::floor_minute(index::to_reference(&Zoned::now()));
    let from = to.saturating_sub(Span::new().hours(HOURS));
    for field in [FieldKind::Raw, FieldKind::Cumulative] {
        write_constant(store, field, from, to).await?;
    }
    info!("seeded device {DEVICE_ID} counter {COUNTER_ID} with {HOURS}h of {FLOW_VALUE} l/min");
    Ok(())
}

/// One write per touched calendar year, since minute offsets restart at
/// January 1.
async fn write_constant(
    store: &Store,
    field: FieldKind,
    from: DateTime,
    to: DateTime,
) -> Result<(), StoreError> {
    let mut cursor = from;
    while cursor < to {
        let year_end = date(cursor.year() + 1, 1, 1).at(0, 0, 0, 0);
        let stop = if year_end < to { year_end } else { to };
        let minutes = stop.duration_since(cursor).as_mins();
        store
            .write_record_range(
                DEVICE_ID,
                COUNTER_ID,
                field,
                index::byte_offset(cursor),
                encode_samples(&vec![FLOW_VALUE; minutes as usize]),
                index::minutes_in_year(cursor.year()) * 2,
            )
            .await?;
        cursor = stop;
    }
    Ok(())
}
