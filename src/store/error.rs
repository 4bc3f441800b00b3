use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error `{0}`")]
    Sqlite(#[from] tokio_rusqlite::Error),
    #[error("no counter row for device `{device_id}` counter `{counter_id}`")]
    CounterNotFound { device_id: u32, counter_id: u32 },
}
