use thiserror::Error;

use crate::{
    delivery::error::DeliveryError, series::error::SeriesError, store::error::StoreError,
    units::UnsupportedUnit,
};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("series error `{0}`")]
    Series(#[from] SeriesError),
    #[error("delivery error `{0}`")]
    Delivery(#[from] DeliveryError),
    #[error("store error `{0}`")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Unit(#[from] UnsupportedUnit),
}
