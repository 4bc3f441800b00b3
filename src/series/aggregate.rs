//! Fixed width window averaging over minute samples.

use jiff::Span;
use jiff::civil::DateTime;

use super::{RawSample, error::SeriesError};

/// Mean flow over one window, plus how many minutes actually contributed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatedPoint {
    pub window_start: DateTime,
    pub average: f64,
    pub minutes_sampled: usize,
}

/// Averages `samples` into consecutive `window_minutes` wide windows anchored
/// at `from`, not at clock boundaries. Samples outside `[from, to)` are
/// ignored and windows without any sample are not emitted, so gaps never
/// drag an average down. The final window may cover fewer minutes when `to`
/// cuts it short.
pub fn aggregate_by_window(
    samples: &[RawSample],
    from: DateTime,
    to: DateTime,
    window_minutes: i64,
) -> Result<Vec<AggregatedPoint>, SeriesError> {
    if window_minutes <= 0 {
        return Err(SeriesError::InvalidWindow {
            minutes: window_minutes,
        });
    }
    if to <= from {
        return Err(SeriesError::InvalidRange { from, to });
    }

    let mut points = Vec::new();
    let mut open: Option<(i64, u64, usize)> = None;

    for sample in samples {
        if sample.at < from || sample.at >= to {
            continue;
        }
        let idx = sample.at.duration_since(from).as_mins() / window_minutes;
        match &mut open {
            Some((current, sum, count)) if *current == idx => {
                *sum += u64::from(sample.value);
                *count += 1;
            }
            _ => {
                if let Some(done) = open.take() {
                    points.push(close_window(done, from, window_minutes));
                }
                open = Some((idx, u64::from(sample.value), 1));
            }
        }
    }
    if let Some(done) = open.take() {
        points.push(close_window(done, from, window_minutes));
    }
    Ok(points)
}

fn close_window(
    (idx, sum, count): (i64, u64, usize),
    from: DateTime,
    window_minutes: i64,
) -> AggregatedPoint {
    AggregatedPoint {
        window_start: from.saturating_add(Span::new().minutes(idx * window_minutes)),
        average: sum as f64 / count as f64,
        minutes_sampled: count,
    }
}
