use std::{error::Error, fs};

use ron::{Options, extensions::Extensions};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::CONFIG_VERSION;

#[derive(Debug, Deserialize, Serialize)]
pub struct AquaConfig {
    pub version: f32,
    pub database: String,
    pub export: ExportSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
pub struct ExportSettings {
    /// How far back each export cycle reaches.
    pub lookback_hours: i64,
    /// Minutes between export cycles.
    pub interval_minutes: u64,
}

impl AquaConfig {
    pub fn from_file(file_path: &str) -> Result<Self, Box<dyn Error>> {
        Self::parse(&fs::read_to_string(file_path)?)
    }

    pub fn parse(s: &str) -> Result<Self, Box<dyn Error>> {
        let options = Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .with_default_extension(Extensions::UNWRAP_NEWTYPES)
            .with_default_extension(Extensions::UNWRAP_VARIANT_NEWTYPES);
        Ok(options.from_str(s)?)
    }

    pub fn load_or_default(file_path: &str) -> Self {
        match Self::from_file(file_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("could not load `{file_path}` ({e}), using defaults");
                Self::default()
            }
        }
    }
}

impl Default for AquaConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            database: "./aqua104.db".to_string(),
            export: ExportSettings {
                lookback_hours: 24,
                interval_minutes: 60,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_config() {
        let cfg = AquaConfig::parse(
            r#"(
                version: 0.1,
                database: "/var/lib/aqua104/aqua104.db",
                export: (
                    lookback_hours: 24,
                    interval_minutes: 60,
                ),
            )"#,
        )
        .unwrap();

        assert_eq!(cfg.version, 0.1);
        assert_eq!(cfg.database, "/var/lib/aqua104/aqua104.db");
        assert_eq!(cfg.export.lookback_hours, 24);
        assert_eq!(cfg.export.interval_minutes, 60);
    }

    #[test]
    fn rejects_incomplete_configs() {
        assert!(AquaConfig::parse("(version: 0.1)").is_err());
        assert!(AquaConfig::parse("garbage").is_err());
    }

    #[test]
    fn defaults_cover_a_missing_file() {
        let cfg = AquaConfig::load_or_default("/definitely/not/here.ron");
        assert_eq!(cfg.version, CONFIG_VERSION);
        assert_eq!(cfg.export.lookback_hours, 24);
    }
}
