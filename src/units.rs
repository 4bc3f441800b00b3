use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported flow unit `{0}`")]
pub struct UnsupportedUnit(pub String);

/// Flow units a client may request. Stored samples are always l/min.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowUnit {
    LitersPerMinute,
    LitersPerSecond,
    CubicMetersPerMinute,
    CubicMetersPerHour,
}

impl FlowUnit {
    /// Multiplier applied to a value in l/min to express it in this unit.
    pub const fn factor(self) -> f64 {
        match self {
            Self::LitersPerMinute => 1.0,
            Self::LitersPerSecond => 1.0 / 60.0,
            Self::CubicMetersPerMinute => 1.0 / 1000.0,
            Self::CubicMetersPerHour => 60.0 / 1000.0,
        }
    }

    pub fn convert(self, liters_per_minute: f64) -> f64 {
        liters_per_minute * self.factor()
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::LitersPerMinute => "l/min",
            Self::LitersPerSecond => "l/s",
            Self::CubicMetersPerMinute => "m3/min",
            Self::CubicMetersPerHour => "m3/h",
        }
    }
}

impl FromStr for FlowUnit {
    type Err = UnsupportedUnit;

    /// Exact match only, case sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "l/min" => Ok(Self::LitersPerMinute),
            "l/s" => Ok(Self::LitersPerSecond),
            "m3/min" => Ok(Self::CubicMetersPerMinute),
            "m3/h" => Ok(Self::CubicMetersPerHour),
            other => Err(UnsupportedUnit(other.to_string())),
        }
    }
}

impl fmt::Display for FlowUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn identity_and_factors() {
        assert_eq!(FlowUnit::LitersPerMinute.convert(500.0), 500.0);
        assert_eq!(FlowUnit::LitersPerSecond.convert(600.0), 10.0);
        assert_eq!(FlowUnit::CubicMetersPerMinute.convert(500.0), 0.5);
        assert_eq!(FlowUnit::CubicMetersPerHour.convert(1.0), 0.06);
    }

    #[test]
    fn parse_exact_labels() {
        for unit in [
            FlowUnit::LitersPerMinute,
            FlowUnit::LitersPerSecond,
            FlowUnit::CubicMetersPerMinute,
            FlowUnit::CubicMetersPerHour,
        ] {
            assert_eq!(unit.label().parse::<FlowUnit>().unwrap(), unit);
        }
    }

    #[test]
    fn parse_rejects_unknown_and_wrong_case() {
        assert_eq!(
            "l/h".parse::<FlowUnit>(),
            Err(UnsupportedUnit("l/h".to_string()))
        );
        assert!("L/min".parse::<FlowUnit>().is_err());
        assert!("l/min ".parse::<FlowUnit>().is_err());
        assert!("".parse::<FlowUnit>().is_err());
    }
}
