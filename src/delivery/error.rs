use thiserror::Error;

use crate::store::error::StoreError;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("store error `{0}`")]
    Store(#[from] StoreError),
}
