//! Minute indexed flow series stored as one record per counter per year,
//! two big endian bytes per minute.

pub mod aggregate;
pub mod error;
pub mod index;

use jiff::Span;
use jiff::civil::DateTime;

use crate::{
    series::error::SeriesError,
    store::{FieldKind, Store},
};

/// One decoded minute sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    pub at: DateTime,
    pub value: u16,
}

/// Read side of the yearly minute records.
#[derive(Clone)]
pub struct SeriesReader {
    store: Store,
}

impl SeriesReader {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Decodes every stored minute in `[from, to)` of one counter record.
    ///
    /// Only the touched byte range is fetched from the store, never the whole
    /// record. Minutes the record does not cover yet are absent from the
    /// result rather than padded.
    pub async fn extract(
        &self,
        device_id: u32,
        counter_id: u32,
        field: FieldKind,
        from: DateTime,
        to: DateTime,
    ) -> Result<Vec<RawSample>, SeriesError> {
        index::ensure_single_year(from, to)?;
        let minutes = index::minute_count(from, to)?;
        let start = index::byte_offset(from);
        let bytes = self
            .store
            .read_record_range(device_id, counter_id, field, start, minutes * 2)
            .await?
            .ok_or(SeriesError::RecordNotFound {
                device_id,
                counter_id,
                field,
            })?;
        let samples = decode_samples(&bytes)
            .into_iter()
            .enumerate()
            .map(|(i, value)| RawSample {
                at: from.saturating_add(Span::new().minutes(i as i64)),
                value,
            })
            .collect();
        Ok(samples)
    }
}

/// Packs minute values as consecutive big endian pairs.
pub fn encode_samples(values: &[u16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * 2);
    for value in values {
        bytes.extend_from_slice(&value.to_be_bytes());
    }
    bytes
}

/// Unpacks big endian pairs. A trailing odd byte is not a sample and is
/// dropped.
pub fn decode_samples(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    #[test]
    fn codec_round_trips_and_drops_odd_byte() {
        let values = [0u16, 1, 500, u16::MAX];
        let bytes = encode_samples(&values);
        assert_eq!(bytes.len(), 8);
        assert_eq!(decode_samples(&bytes), values);

        let mut clipped = bytes.clone();
        clipped.push(0xAB);
        assert_eq!(decode_samples(&clipped), values);

        assert_eq!(decode_samples(&[]), Vec::<u16>::new());
        assert_eq!(decode_samples(&[0x01]), Vec::<u16>::new());
    }

    #[tokio::test]
    async fn extract_reads_only_the_requested_window() {
        let store = Store::open_in_memory().await.unwrap();
        store.create_counter(7, 3, "borehole").await.unwrap();

        // ten minutes of data starting at midnight June 1st
        let from = date(2024, 6, 1).at(0, 0, 0, 0);
        let values: Vec<u16> = (100..110).collect();
        store
            .write_record_range(
                7,
                3,
                FieldKind::Raw,
                index::byte_offset(from),
                encode_samples(&values),
                index::minutes_in_year(2024) * 2,
            )
            .await
            .unwrap();

        let reader = SeriesReader::new(store);
        let got = reader
            .extract(
                7,
                3,
                FieldKind::Raw,
                date(2024, 6, 1).at(0, 2, 0, 0),
                date(2024, 6, 1).at(0, 5, 0, 0),
            )
            .await
            .unwrap();

        assert_eq!(got.len(), 3);
        assert_eq!(got[0].at, date(2024, 6, 1).at(0, 2, 0, 0));
        assert_eq!(got[0].value, 102);
        assert_eq!(got[2].at, date(2024, 6, 1).at(0, 4, 0, 0));
        assert_eq!(got[2].value, 104);
    }

    #[tokio::test]
    async fn extract_clips_past_the_stored_end() {
        let store = Store::open_in_memory().await.unwrap();
        store.create_counter(7, 3, "borehole").await.unwrap();

        // record covers exactly the first four minutes of the year
        let jan1 = date(2024, 1, 1).at(0, 0, 0, 0);
        store
            .put_record(7, 3, FieldKind::Raw, encode_samples(&[1, 2, 3, 4]))
            .await
            .unwrap();

        let reader = SeriesReader::new(store);
        let got = reader
            .extract(
                7,
                3,
                FieldKind::Raw,
                jan1,
                date(2024, 1, 1).at(0, 10, 0, 0),
            )
            .await
            .unwrap();

        assert_eq!(
            got.iter().map(|s| s.value).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }

    #[tokio::test]
    async fn extract_requires_a_written_record() {
        let store = Store::open_in_memory().await.unwrap();
        store.create_counter(7, 3, "borehole").await.unwrap();

        let reader = SeriesReader::new(store);
        let from = date(2024, 6, 1).at(0, 0, 0, 0);
        let to = date(2024, 6, 1).at(1, 0, 0, 0);

        let err = reader
            .extract(7, 3, FieldKind::Cumulative, from, to)
            .await
            .unwrap_err();
        assert!(matches!(err, SeriesError::RecordNotFound { .. }));

        let err = reader
            .extract(9, 9, FieldKind::Raw, from, to)
            .await
            .unwrap_err();
        assert!(matches!(err, SeriesError::RecordNotFound { .. }));
    }

    #[tokio::test]
    async fn extract_rejects_cross_year_ranges() {
        let store = Store::open_in_memory().await.unwrap();
        store.create_counter(7, 3, "borehole").await.unwrap();

        let reader = SeriesReader::new(store);
        let err = reader
            .extract(
                7,
                3,
                FieldKind::Raw,
                date(2024, 12, 31).at(23, 0, 0, 0),
                date(2025, 1, 1).at(1, 0, 0, 0),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SeriesError::YearBoundary { .. }));
    }
}
