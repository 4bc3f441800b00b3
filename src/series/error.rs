use jiff::civil::DateTime;
use thiserror::Error;

use crate::store::{FieldKind, error::StoreError};

#[derive(Error, Debug)]
pub enum SeriesError {
    #[error("invalid range: `{to}` is not after `{from}`")]
    InvalidRange { from: DateTime, to: DateTime },
    #[error("range `{from}`..`{to}` spans more than one calendar year")]
    YearBoundary { from: DateTime, to: DateTime },
    #[error("no {field} record for device `{device_id}` counter `{counter_id}`")]
    RecordNotFound {
        device_id: u32,
        counter_id: u32,
        field: FieldKind,
    },
    #[error("invalid window of `{minutes}` minutes")]
    InvalidWindow { minutes: i64 },
    #[error("store error `{0}`")]
    Store(#[from] StoreError),
}
