//! Executes parsed commands against the store.

use std::error::Error;

use jiff::{Span, Zoned};

use crate::{
    cli::model::{Cli, CliCommands},
    config::AquaConfig,
    delivery::DeliveryBuffer,
    export::{Exporter, task},
    seed,
    series::{SeriesReader, index},
    store::Store,
};

pub async fn dispatch(cli: Cli, cfg: AquaConfig) -> Result<(), Box<dyn Error>> {
    let store = Store::open(&cfg.database).await?;

    match cli.command {
        CliCommands::InitDb => {
            // opening applies the schema
            println!("database ready at {}", cfg.database);
        }
        CliCommands::Seed => {
            seed::run(&store).await?;
            println!("demo data seeded");
        }
        CliCommands::Ingest {
            device_id,
            counter_id,
            file,
            field,
        } => {
            let bytes = tokio::fs::read(&file).await?;
            let len = bytes.len();
            store.put_record(device_id, counter_id, field, bytes).await?;
            println!("loaded {len} bytes into {field} of device {device_id} counter {counter_id}");
        }
        CliCommands::Value {
            device_id,
            counter_id,
            at,
            field,
        } => {
            let from = index::floor_minute(at);
            let to = from.saturating_add(Span::new().minutes(1));
            let reader = SeriesReader::new(store);
            let samples = reader.extract(device_id, counter_id, field, from, to).await?;
            match samples.first() {
                Some(sample) => println!("{} -> {} l/min", sample.at, sample.value),
                None => println!("no data at {from}"),
            }
        }
        CliCommands::Export => {
            let exporter = Exporter::new(store, cfg.export.lookback_hours);
            let now = index::to_reference(&Zoned::now());
            let report = exporter.run_cycle(now).await?;
            println!(
                "{} config(s) processed, {} failed, {} point(s) staged",
                report.processed, report.failed, report.staged
            );
        }
        CliCommands::Serve => {
            let exporter = Exporter::new(store, cfg.export.lookback_hours);
            task::run(exporter, cfg.export.interval_minutes).await;
        }
        CliCommands::Interrogate {
            common_address,
            ack,
        } => {
            let buffer = DeliveryBuffer::new(store);
            let pending = buffer.pull_unacknowledged(common_address).await?;
            for record in &pending {
                println!(
                    "ioa {} period {:>3}m {} -> {}",
                    record.ioa_address, record.period_minutes, record.window_start, record.value
                );
            }
            if ack {
                let flipped = buffer
                    .acknowledge(pending.iter().map(|r| r.id).collect())
                    .await?;
                println!("{flipped} point(s) acknowledged");
            } else {
                println!("{} point(s) pending", pending.len());
            }
        }
    }
    Ok(())
}
