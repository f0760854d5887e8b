use std::{fmt, time::Duration};

use serde::Serialize;

use super::config::PollingConfig;

/// Message volume tiers, from no traffic at all to a constantly busy queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeClass {
    Idle,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl VolumeClass {
    /// Lower bounds are inclusive, so an average sitting exactly on a threshold belongs to the
    /// busier tier.
    pub fn from_average(average: f64, config: &PollingConfig) -> Self {
        match average {
            a if a <= 0.0 => VolumeClass::Idle,
            a if a < config.low_threshold => VolumeClass::Low,
            a if a < config.medium_threshold => VolumeClass::Medium,
            a if a < config.high_threshold => VolumeClass::High,
            _ => VolumeClass::VeryHigh,
        }
    }

    pub fn wait_time(&self, config: &PollingConfig) -> Duration {
        match self {
            VolumeClass::Idle => config.idle_wait,
            VolumeClass::Low => config.low_wait,
            VolumeClass::Medium => config.medium_wait,
            VolumeClass::High => config.high_wait,
            VolumeClass::VeryHigh => config.very_high_wait,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeClass::Idle => "idle",
            VolumeClass::Low => "low",
            VolumeClass::Medium => "medium",
            VolumeClass::High => "high",
            VolumeClass::VeryHigh => "very_high",
        }
    }
}

impl fmt::Display for VolumeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn classify(average: f64, config: &PollingConfig) -> Duration {
    VolumeClass::from_average(average, config).wait_time(config)
}
