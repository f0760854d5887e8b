use chrono::{DateTime, Duration, Utc};

use super::state::PollingState;

/// Empty polls arriving closer than this to the last update do not decay the average.
const MIN_DECAY_GAP: Duration = Duration::seconds(2);

/// Decayed averages below this are treated as idle.
const DECAY_FLOOR: f64 = 0.2;

/// Record an empty poll and, once enough have been seen in a row, decay the average by the
/// time elapsed since the last non-empty observation.
///
/// Returns the decay factor that was applied, if any.
pub(crate) fn decay_on_empty(
    state: &mut PollingState,
    consecutive_empty_threshold: u32,
    half_life: std::time::Duration,
    now: DateTime<Utc>,
) -> Option<f64> {
    state.consecutive_empty_count = state.consecutive_empty_count.saturating_add(1);

    if state.consecutive_empty_count < consecutive_empty_threshold {
        return None;
    }

    // Nothing has ever been observed, so there is nothing to decay
    let last_update_time = state.last_update_time?;

    let since_last_update = now - last_update_time;
    if since_last_update < MIN_DECAY_GAP {
        return None;
    }

    let elapsed_seconds = since_last_update.num_milliseconds() as f64 / 1000.0;
    let decay = 0.5_f64.powf(elapsed_seconds / half_life.as_secs_f64());

    state.average *= decay;

    if state.average < DECAY_FLOOR {
        state.average = 0.0;
    }

    Some(decay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time;

    const HALF_LIFE: std::time::Duration = std::time::Duration::from_secs(30);
    const EPSILON: f64 = 1e-9;

    fn state_updated_at(average: f64, last_update_time: DateTime<Utc>) -> PollingState {
        PollingState {
            average,
            last_update_time: Some(last_update_time),
            ..PollingState::new(true)
        }
    }

    #[test]
    fn first_empty_poll_does_not_decay() {
        let start = time::now();
        let mut state = state_updated_at(4.0, start);

        let decay = decay_on_empty(&mut state, 2, HALF_LIFE, start + Duration::seconds(60));

        assert_eq!(decay, None);
        assert_eq!(state.average, 4.0);
        assert_eq!(state.consecutive_empty_count, 1);
    }

    #[test]
    fn one_half_life_halves_the_average() {
        let start = time::now();
        let mut state = state_updated_at(4.0, start);

        decay_on_empty(&mut state, 2, HALF_LIFE, start + Duration::seconds(1));
        let decay = decay_on_empty(&mut state, 2, HALF_LIFE, start + Duration::seconds(30));

        assert!((decay.unwrap() - 0.5).abs() < EPSILON);
        assert!((state.average - 2.0).abs() < EPSILON);
    }

    #[test]
    fn decays_are_measured_from_last_update() {
        let start = time::now();
        let mut state = state_updated_at(3.0, start);

        decay_on_empty(&mut state, 2, HALF_LIFE, start + Duration::seconds(1));
        decay_on_empty(&mut state, 2, HALF_LIFE, start + Duration::seconds(35));

        let expected = 3.0 * 0.5_f64.powf(35.0 / 30.0);
        assert!((state.average - expected).abs() < EPSILON);

        // The next decay uses the full 90 seconds since the last update, on top of the first one
        decay_on_empty(&mut state, 2, HALF_LIFE, start + Duration::seconds(90));
        let expected = expected * 0.5_f64.powf(90.0 / 30.0);
        assert!(expected < DECAY_FLOOR);
        assert_eq!(state.average, 0.0);
    }

    #[test]
    fn skips_rapid_empty_polls() {
        let start = time::now();
        let mut state = state_updated_at(4.0, start);
        state.consecutive_empty_count = 5;

        let decay = decay_on_empty(&mut state, 2, HALF_LIFE, start + Duration::milliseconds(1999));

        assert_eq!(decay, None);
        assert_eq!(state.average, 4.0);
        assert_eq!(state.consecutive_empty_count, 6);
    }

    #[test]
    fn nothing_to_decay_without_an_update() {
        let mut state = PollingState::new(true);

        for _ in 0..3 {
            assert_eq!(decay_on_empty(&mut state, 2, HALF_LIFE, time::now()), None);
        }
        assert_eq!(state.average, 0.0);
        assert_eq!(state.consecutive_empty_count, 3);
    }

    #[test]
    fn small_averages_snap_to_zero() {
        let start = time::now();
        let mut state = state_updated_at(0.3, start);
        state.consecutive_empty_count = 1;

        decay_on_empty(&mut state, 2, HALF_LIFE, start + Duration::seconds(30));

        assert_eq!(state.average, 0.0);
    }
}
