use chrono::{DateTime, Utc};
use serde::Serialize;

/// Mutable volume tracking state for one controller.
///
/// Every field is read and written under the controller's single lock, the timestamps used for
/// decay timing are never updated separately from the average they describe.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct PollingState {
    /// EWMA of observed message counts, never negative
    pub average: f64,
    /// Time of the last non-empty observation
    pub last_update_time: Option<DateTime<Utc>>,
    /// Consecutive observations with fewer than [`LOW_VOLUME_MESSAGE_THRESHOLD`] messages
    ///
    /// [`LOW_VOLUME_MESSAGE_THRESHOLD`]: super::drop_detection::LOW_VOLUME_MESSAGE_THRESHOLD
    pub low_volume_cycle_count: u32,
    /// Consecutive polls which returned nothing
    pub consecutive_empty_count: u32,
    /// Time of the last drop-triggered reset
    pub last_reset_time: Option<DateTime<Utc>>,
    pub enabled: bool,
}

impl PollingState {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    pub fn snapshot(&self) -> PollingSnapshot {
        PollingSnapshot {
            enabled: self.enabled,
            average: self.average,
            last_update_time: self.last_update_time,
            low_volume_cycle_count: self.low_volume_cycle_count,
            consecutive_empty_count: self.consecutive_empty_count,
            last_reset_time: self.last_reset_time,
        }
    }
}

/// Point-in-time copy of a controller's state, used for diagnostics.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PollingSnapshot {
    pub enabled: bool,
    pub average: f64,
    pub last_update_time: Option<DateTime<Utc>>,
    pub low_volume_cycle_count: u32,
    pub consecutive_empty_count: u32,
    pub last_reset_time: Option<DateTime<Utc>>,
}
