use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{cli::model::Cli, config::AquaConfig};

pub mod cli;
pub mod config;
pub mod delivery;
pub mod export;
pub mod seed;
pub mod series;
pub mod store;
pub mod units;

pub const CONFIG_VERSION: f32 = 0.1;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = AquaConfig::load_or_default(&cli.config);
    if cfg.version != CONFIG_VERSION {
        panic!(
            "Wrong config version. Got {}, expected {}.",
            cfg.version, CONFIG_VERSION
        );
    }

    cli::dispatcher::dispatch(cli, cfg).await
}
