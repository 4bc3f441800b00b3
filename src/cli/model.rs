use clap_derive::{Parser, Subcommand};
use jiff::civil::DateTime;

use crate::store::FieldKind;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the RON config file
    #[arg(long, default_value = "./aqua104.ron")]
    pub config: String,

    #[command(subcommand)]
    pub command: CliCommands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommands {
    /// Create the database schema
    InitDb,
    /// Insert a demo counter, its config and a day of flow data
    Seed,
    /// Load a binary minute record from a file
    Ingest {
        device_id: u32,
        counter_id: u32,
        /// File holding the record, two bytes per minute
        file: String,
        #[arg(long, value_enum, default_value_t = FieldKind::Cumulative)]
        field: FieldKind,
    },
    /// Print one minute's value
    Value {
        device_id: u32,
        counter_id: u32,
        /// Minute to read, e.g. 2024-06-01T12:30
        at: DateTime,
        #[arg(long, value_enum, default_value_t = FieldKind::Cumulative)]
        field: FieldKind,
    },
    /// Run one export cycle now
    Export,
    /// Run export cycles on a timer until interrupted
    Serve,
    /// Answer a general interrogation: list pending points
    #[command(alias = "gi")]
    Interrogate {
        common_address: u16,
        /// Mark the listed points as delivered
        #[arg(long)]
        ack: bool,
    },
}
