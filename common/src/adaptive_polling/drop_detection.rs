use chrono::{DateTime, Duration, Utc};

use super::state::PollingState;

/// A poll returning fewer messages than this counts as a low volume cycle.
pub(crate) const LOW_VOLUME_MESSAGE_THRESHOLD: usize = 2;

/// The average must have fallen below this before it can be reset.
const RESET_AVERAGE_THRESHOLD: f64 = 1.0;

const MIN_RESET_INTERVAL: Duration = Duration::minutes(1);

/// Track low volume cycles after a non-empty observation has been blended into the average,
/// resetting the average once traffic has clearly dropped off.
///
/// Returns `true` if the average was reset.
pub(crate) fn detect_drop(
    state: &mut PollingState,
    observed: usize,
    drop_detection_threshold: u32,
    now: DateTime<Utc>,
) -> bool {
    if observed >= LOW_VOLUME_MESSAGE_THRESHOLD {
        state.low_volume_cycle_count = 0;
        return false;
    }

    state.low_volume_cycle_count = state.low_volume_cycle_count.saturating_add(1);

    if !should_reset(state, drop_detection_threshold, now) {
        return false;
    }

    state.average = 0.0;
    state.low_volume_cycle_count = 0;
    state.last_reset_time = Some(now);

    true
}

fn should_reset(state: &PollingState, drop_detection_threshold: u32, now: DateTime<Utc>) -> bool {
    let has_enough_low_volume_cycles = state.low_volume_cycle_count >= drop_detection_threshold;
    let is_average_below_threshold = state.average < RESET_AVERAGE_THRESHOLD;
    let has_minimum_time_passed = match state.last_reset_time {
        Some(last_reset_time) => now - last_reset_time > MIN_RESET_INTERVAL,
        None => true,
    };

    has_enough_low_volume_cycles && is_average_below_threshold && has_minimum_time_passed
}
