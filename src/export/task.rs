//! Long running export loop.

use std::time::Duration;

use jiff::Zoned;
use tracing::{Level, debug, error, info, span};

use crate::{export::Exporter, series::index};

/// Runs one export cycle immediately, then one every `interval_minutes`,
/// until ctrl-c.
pub async fn run(exporter: Exporter, interval_minutes: u64) {
    let span = span!(Level::INFO, "Exporter");
    let _enter = span.enter();
    debug!("initializing");

    let interval = Duration::from_secs(interval_minutes * 60);
    loop {
        let now = index::to_reference(&Zoned::now());
        match exporter.run_cycle(now).await {
            Ok(report) => info!(
                "cycle done: {} config(s) ok, {} failed, {} point(s) staged",
                report.processed, report.failed, report.staged
            ),
            Err(e) => error!("cycle failed: {e}"),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down exporter");
                break;
            }
        }
    }
}
