use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_IDLE_WAIT_SECONDS: u64 = 20;
pub const DEFAULT_LOW_VOLUME_WAIT_SECONDS: u64 = 15;
pub const DEFAULT_MEDIUM_VOLUME_WAIT_SECONDS: u64 = 10;
pub const DEFAULT_HIGH_VOLUME_WAIT_SECONDS: u64 = 5;
pub const DEFAULT_VERY_HIGH_VOLUME_WAIT_SECONDS: u64 = 1;
pub const DEFAULT_VISIBILITY_TIMEOUT_SECONDS: u64 = 30;

pub const DEFAULT_LOW_VOLUME_THRESHOLD: f64 = 2.0;
pub const DEFAULT_MEDIUM_VOLUME_THRESHOLD: f64 = 5.0;
pub const DEFAULT_HIGH_VOLUME_THRESHOLD: f64 = 10.0;

pub const DEFAULT_EWMA_ALPHA: f64 = 0.3;
pub const DEFAULT_DROP_DETECTION_THRESHOLD: u32 = 10;
pub const DEFAULT_DECAY_HALF_LIFE_SECONDS: u64 = 30;
pub const DEFAULT_CONSECUTIVE_EMPTY_THRESHOLD: u32 = 2;

/// SQS refuses visibility timeouts longer than 12 hours.
pub const MAX_VISIBILITY_TIMEOUT_SECONDS: u64 = 43_200;

#[derive(Error, Debug, PartialEq)]
pub enum PollingConfigError {
    #[error("EWMA alpha must be in the range (0, 1], got {0}")]
    InvalidAlpha(f64),
    #[error("Volume threshold '{0}' must be positive, got {1}")]
    NonPositiveThreshold(&'static str, f64),
    #[error("Volume threshold '{0}' must be finite, got {1}")]
    NonFiniteThreshold(&'static str, f64),
    #[error("Volume thresholds must be strictly increasing, got low={0}, medium={1}, high={2}")]
    NonMonotonicThresholds(f64, f64, f64),
    #[error("Visibility timeout of {0} seconds exceeds the maximum of {MAX_VISIBILITY_TIMEOUT_SECONDS} seconds")]
    VisibilityTimeoutTooLong(u64),
}

/// Validated, immutable configuration for an [`AdaptivePollingController`].
///
/// Build one with [`PollingConfig::builder`]. Any option left unset, or set to zero, takes its
/// documented default.
///
/// [`AdaptivePollingController`]: super::AdaptivePollingController
#[derive(Clone, Debug, PartialEq)]
pub struct PollingConfig {
    pub(crate) idle_wait: Duration,
    pub(crate) low_wait: Duration,
    pub(crate) medium_wait: Duration,
    pub(crate) high_wait: Duration,
    pub(crate) very_high_wait: Duration,
    pub(crate) disabled_wait: Duration,
    pub(crate) visibility_timeout: Duration,

    pub(crate) low_threshold: f64,
    pub(crate) medium_threshold: f64,
    pub(crate) high_threshold: f64,

    pub(crate) alpha: f64,
    pub(crate) drop_detection_threshold: u32,
    pub(crate) decay_half_life: Duration,
    pub(crate) consecutive_empty_threshold: u32,
}

impl PollingConfig {
    pub fn builder() -> PollingConfigBuilder {
        PollingConfigBuilder::default()
    }

    pub fn idle_wait(&self) -> Duration {
        self.idle_wait
    }

    pub fn low_wait(&self) -> Duration {
        self.low_wait
    }

    pub fn medium_wait(&self) -> Duration {
        self.medium_wait
    }

    pub fn high_wait(&self) -> Duration {
        self.high_wait
    }

    pub fn very_high_wait(&self) -> Duration {
        self.very_high_wait
    }

    /// The wait handed out while adaptive polling is disabled.
    pub fn disabled_wait(&self) -> Duration {
        self.disabled_wait
    }

    pub fn visibility_timeout(&self) -> Duration {
        self.visibility_timeout
    }

    pub fn low_threshold(&self) -> f64 {
        self.low_threshold
    }

    pub fn medium_threshold(&self) -> f64 {
        self.medium_threshold
    }

    pub fn high_threshold(&self) -> f64 {
        self.high_threshold
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn drop_detection_threshold(&self) -> u32 {
        self.drop_detection_threshold
    }

    pub fn decay_half_life(&self) -> Duration {
        self.decay_half_life
    }

    pub fn consecutive_empty_threshold(&self) -> u32 {
        self.consecutive_empty_threshold
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        PollingConfigBuilder::default()
            .build()
            .expect("default polling configuration is valid")
    }
}

/// Collects polling options before validating them into a [`PollingConfig`].
#[derive(Clone, Debug, Default)]
pub struct PollingConfigBuilder {
    idle_wait_seconds: Option<u64>,
    low_volume_wait_seconds: Option<u64>,
    medium_volume_wait_seconds: Option<u64>,
    high_volume_wait_seconds: Option<u64>,
    very_high_volume_wait_seconds: Option<u64>,
    disabled_wait_seconds: Option<u64>,
    visibility_timeout_seconds: Option<u64>,

    low_volume_threshold: Option<f64>,
    medium_volume_threshold: Option<f64>,
    high_volume_threshold: Option<f64>,

    ewma_alpha: Option<f64>,
    drop_detection_threshold: Option<u32>,
    decay_half_life_seconds: Option<u64>,
    consecutive_empty_threshold: Option<u32>,
}

/// Treats both `None` and the type's zero value as "not configured".
fn get_or_default<T>(value: Option<T>, default: T) -> T
where
    T: Default + PartialEq,
{
    match value {
        Some(value) if value != T::default() => value,
        _ => default,
    }
}

impl PollingConfigBuilder {
    pub fn idle_wait_seconds(mut self, seconds: u64) -> Self {
        self.idle_wait_seconds = Some(seconds);
        self
    }

    pub fn low_volume_wait_seconds(mut self, seconds: u64) -> Self {
        self.low_volume_wait_seconds = Some(seconds);
        self
    }

    pub fn medium_volume_wait_seconds(mut self, seconds: u64) -> Self {
        self.medium_volume_wait_seconds = Some(seconds);
        self
    }

    pub fn high_volume_wait_seconds(mut self, seconds: u64) -> Self {
        self.high_volume_wait_seconds = Some(seconds);
        self
    }

    pub fn very_high_volume_wait_seconds(mut self, seconds: u64) -> Self {
        self.very_high_volume_wait_seconds = Some(seconds);
        self
    }

    /// Wait used while adaptive polling is disabled. Unlike the other waits zero is a real
    /// value here and means short polling.
    pub fn disabled_wait_seconds(mut self, seconds: u64) -> Self {
        self.disabled_wait_seconds = Some(seconds);
        self
    }

    pub fn visibility_timeout_seconds(mut self, seconds: u64) -> Self {
        self.visibility_timeout_seconds = Some(seconds);
        self
    }

    pub fn volume_thresholds(mut self, low: f64, medium: f64, high: f64) -> Self {
        self.low_volume_threshold = Some(low);
        self.medium_volume_threshold = Some(medium);
        self.high_volume_threshold = Some(high);
        self
    }

    pub fn ewma_alpha(mut self, alpha: f64) -> Self {
        self.ewma_alpha = Some(alpha);
        self
    }

    pub fn drop_detection_threshold(mut self, cycles: u32) -> Self {
        self.drop_detection_threshold = Some(cycles);
        self
    }

    pub fn decay_half_life_seconds(mut self, seconds: u64) -> Self {
        self.decay_half_life_seconds = Some(seconds);
        self
    }

    pub fn consecutive_empty_threshold(mut self, polls: u32) -> Self {
        self.consecutive_empty_threshold = Some(polls);
        self
    }

    pub fn build(self) -> Result<PollingConfig, PollingConfigError> {
        let alpha = get_or_default(self.ewma_alpha, DEFAULT_EWMA_ALPHA);
        // Written as a negation so that NaN is rejected too
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(PollingConfigError::InvalidAlpha(alpha));
        }

        let low_threshold = get_or_default(self.low_volume_threshold, DEFAULT_LOW_VOLUME_THRESHOLD);
        let medium_threshold = get_or_default(
            self.medium_volume_threshold,
            DEFAULT_MEDIUM_VOLUME_THRESHOLD,
        );
        let high_threshold =
            get_or_default(self.high_volume_threshold, DEFAULT_HIGH_VOLUME_THRESHOLD);

        for (name, threshold) in [
            ("low", low_threshold),
            ("medium", medium_threshold),
            ("high", high_threshold),
        ] {
            if !(threshold > 0.0) {
                return Err(PollingConfigError::NonPositiveThreshold(name, threshold));
            }
            if !threshold.is_finite() {
                return Err(PollingConfigError::NonFiniteThreshold(name, threshold));
            }
        }

        if !(low_threshold < medium_threshold && medium_threshold < high_threshold) {
            return Err(PollingConfigError::NonMonotonicThresholds(
                low_threshold,
                medium_threshold,
                high_threshold,
            ));
        }

        let drop_detection_threshold = get_or_default(
            self.drop_detection_threshold,
            DEFAULT_DROP_DETECTION_THRESHOLD,
        );
        let consecutive_empty_threshold = get_or_default(
            self.consecutive_empty_threshold,
            DEFAULT_CONSECUTIVE_EMPTY_THRESHOLD,
        );
        let decay_half_life_seconds = get_or_default(
            self.decay_half_life_seconds,
            DEFAULT_DECAY_HALF_LIFE_SECONDS,
        );

        let visibility_timeout_seconds = get_or_default(
            self.visibility_timeout_seconds,
            DEFAULT_VISIBILITY_TIMEOUT_SECONDS,
        );
        if visibility_timeout_seconds > MAX_VISIBILITY_TIMEOUT_SECONDS {
            return Err(PollingConfigError::VisibilityTimeoutTooLong(
                visibility_timeout_seconds,
            ));
        }

        let waits = [
            get_or_default(self.idle_wait_seconds, DEFAULT_IDLE_WAIT_SECONDS),
            get_or_default(
                self.low_volume_wait_seconds,
                DEFAULT_LOW_VOLUME_WAIT_SECONDS,
            ),
            get_or_default(
                self.medium_volume_wait_seconds,
                DEFAULT_MEDIUM_VOLUME_WAIT_SECONDS,
            ),
            get_or_default(
                self.high_volume_wait_seconds,
                DEFAULT_HIGH_VOLUME_WAIT_SECONDS,
            ),
            get_or_default(
                self.very_high_volume_wait_seconds,
                DEFAULT_VERY_HIGH_VOLUME_WAIT_SECONDS,
            ),
        ];

        if waits.windows(2).any(|pair| pair[0] < pair[1]) {
            tracing::warn!(
                ?waits,
                "Wait times are not non-increasing, higher volume will not always poll faster"
            );
        }

        let [idle, low, medium, high, very_high] = waits.map(Duration::from_secs);

        Ok(PollingConfig {
            idle_wait: idle,
            low_wait: low,
            medium_wait: medium,
            high_wait: high,
            very_high_wait: very_high,
            disabled_wait: Duration::from_secs(self.disabled_wait_seconds.unwrap_or(0)),
            visibility_timeout: Duration::from_secs(visibility_timeout_seconds),
            low_threshold,
            medium_threshold,
            high_threshold,
            alpha,
            drop_detection_threshold,
            decay_half_life: Duration::from_secs(decay_half_life_seconds),
            consecutive_empty_threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PollingConfig::default();

        assert_eq!(config.idle_wait(), Duration::from_secs(20));
        assert_eq!(config.low_wait(), Duration::from_secs(15));
        assert_eq!(config.medium_wait(), Duration::from_secs(10));
        assert_eq!(config.high_wait(), Duration::from_secs(5));
        assert_eq!(config.very_high_wait(), Duration::from_secs(1));
        assert_eq!(config.disabled_wait(), Duration::ZERO);
        assert_eq!(config.visibility_timeout(), Duration::from_secs(30));
        assert_eq!(config.low_threshold(), 2.0);
        assert_eq!(config.medium_threshold(), 5.0);
        assert_eq!(config.high_threshold(), 10.0);
        assert_eq!(config.alpha(), 0.3);
        assert_eq!(config.drop_detection_threshold(), 10);
        assert_eq!(config.decay_half_life(), Duration::from_secs(30));
        assert_eq!(config.consecutive_empty_threshold(), 2);
    }

    #[test]
    fn zero_values_fall_back_to_defaults() {
        let config = PollingConfig::builder()
            .idle_wait_seconds(0)
            .low_volume_wait_seconds(0)
            .ewma_alpha(0.0)
            .drop_detection_threshold(0)
            .build()
            .unwrap();

        assert_eq!(config, PollingConfig::default());
    }

    #[test]
    fn custom_values_are_kept() {
        let config = PollingConfig::builder()
            .idle_wait_seconds(20)
            .visibility_timeout_seconds(60)
            .low_volume_wait_seconds(12)
            .medium_volume_wait_seconds(8)
            .high_volume_wait_seconds(4)
            .very_high_volume_wait_seconds(1)
            .ewma_alpha(0.4)
            .drop_detection_threshold(8)
            .build()
            .unwrap();

        assert_eq!(config.low_wait(), Duration::from_secs(12));
        assert_eq!(config.medium_wait(), Duration::from_secs(8));
        assert_eq!(config.high_wait(), Duration::from_secs(4));
        assert_eq!(config.visibility_timeout(), Duration::from_secs(60));
        assert_eq!(config.alpha(), 0.4);
        assert_eq!(config.drop_detection_threshold(), 8);
    }

    #[test]
    fn rejects_bad_alpha() {
        for alpha in [-0.1, 1.5, f64::NAN] {
            let result = PollingConfig::builder().ewma_alpha(alpha).build();
            assert!(
                matches!(result, Err(PollingConfigError::InvalidAlpha(_))),
                "alpha {alpha} should be rejected"
            );
        }

        assert!(PollingConfig::builder().ewma_alpha(1.0).build().is_ok());
    }

    #[test]
    fn rejects_non_monotonic_thresholds() {
        let result = PollingConfig::builder()
            .volume_thresholds(5.0, 5.0, 10.0)
            .build();
        assert_eq!(
            result,
            Err(PollingConfigError::NonMonotonicThresholds(5.0, 5.0, 10.0))
        );

        let result = PollingConfig::builder()
            .volume_thresholds(2.0, 12.0, 10.0)
            .build();
        assert!(matches!(
            result,
            Err(PollingConfigError::NonMonotonicThresholds(..))
        ));
    }

    #[test]
    fn rejects_negative_thresholds() {
        let result = PollingConfig::builder()
            .volume_thresholds(-1.0, 5.0, 10.0)
            .build();
        assert_eq!(
            result,
            Err(PollingConfigError::NonPositiveThreshold("low", -1.0))
        );
    }

    #[test]
    fn rejects_infinite_thresholds() {
        let result = PollingConfig::builder()
            .volume_thresholds(2.0, 5.0, f64::INFINITY)
            .build();
        assert_eq!(
            result,
            Err(PollingConfigError::NonFiniteThreshold("high", f64::INFINITY))
        );
    }

    #[test]
    fn rejects_long_visibility_timeout() {
        let result = PollingConfig::builder()
            .visibility_timeout_seconds(MAX_VISIBILITY_TIMEOUT_SECONDS + 1)
            .build();
        assert_eq!(
            result,
            Err(PollingConfigError::VisibilityTimeoutTooLong(43_201))
        );
    }

    #[test]
    fn disabled_wait_zero_is_short_polling() {
        let config = PollingConfig::builder()
            .disabled_wait_seconds(0)
            .build()
            .unwrap();
        assert_eq!(config.disabled_wait(), Duration::ZERO);

        let config = PollingConfig::builder()
            .disabled_wait_seconds(20)
            .build()
            .unwrap();
        assert_eq!(config.disabled_wait(), Duration::from_secs(20));
    }
}
