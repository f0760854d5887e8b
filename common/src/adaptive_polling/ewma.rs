/// A single observation may move the effective count at most this many multiples of the
/// current average above it.
const MAX_SPIKE_FACTOR: f64 = 2.0;

/// Blend a new message count into the running average.
///
/// When there is already an average the observation is clamped to `average * 3` before
/// blending, so one outlier poll can move the average by at most `2 * alpha * average`.
pub(crate) fn update(average: f64, observed: usize, alpha: f64) -> f64 {
    let mut count = observed as f64;

    if average > 0.0 {
        let max_delta = average * MAX_SPIKE_FACTOR;
        if count - average > max_delta {
            count = average + max_delta;
        }
    }

    alpha * count + (1.0 - alpha) * average
}
