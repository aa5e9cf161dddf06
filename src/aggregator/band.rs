use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Performance band of a percentage score.
///
/// | Range   | Band   |
/// |---------|--------|
/// | >= 90   | High   |
/// | >= 80   | Medium |
/// | < 80    | Low    |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl ScoreBand {
    pub fn of(score: f64) -> Self {
        match score {
            s if s >= 90.0 => ScoreBand::High,
            s if s >= 80.0 => ScoreBand::Medium,
            _ => ScoreBand::Low,
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScoreBand::High => "high",
            ScoreBand::Medium => "medium",
            ScoreBand::Low => "low",
        };
        f.write_str(name)
    }
}

impl FromStr for ScoreBand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(ScoreBand::High),
            "medium" => Ok(ScoreBand::Medium),
            "low" => Ok(ScoreBand::Low),
            other => bail!("unknown score band `{other}` (expected high, medium or low)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        assert_eq!(ScoreBand::of(100.0), ScoreBand::High);
        assert_eq!(ScoreBand::of(90.0), ScoreBand::High);
        assert_eq!(ScoreBand::of(89.99), ScoreBand::Medium);
        assert_eq!(ScoreBand::of(80.0), ScoreBand::Medium);
        assert_eq!(ScoreBand::of(79.9), ScoreBand::Low);
        assert_eq!(ScoreBand::of(0.0), ScoreBand::Low);
    }

    #[test]
    fn test_band_nan_is_low() {
        assert_eq!(ScoreBand::of(f64::NAN), ScoreBand::Low);
    }

    #[test]
    fn test_band_round_trips_through_display() {
        for band in [ScoreBand::High, ScoreBand::Medium, ScoreBand::Low] {
            assert_eq!(band.to_string().parse::<ScoreBand>().unwrap(), band);
        }
        assert!("excellent".parse::<ScoreBand>().is_err());
    }
}
