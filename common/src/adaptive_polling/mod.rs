//! Adaptive long-poll wait times driven by observed message volume.
//!
//! Each completed poll is fed to [`AdaptivePollingController::observe`]. Non-empty polls are
//! blended into an exponentially weighted moving average (with spike protection) and a
//! sustained run of near-empty polls resets it. Runs of empty polls decay the average by the
//! time since the last message arrived. Before each poll [`AdaptivePollingController::next_wait_time`]
//! maps the average onto one of five configured wait times, so an idle queue is polled slowly
//! and a busy one quickly.

mod classifier;
mod config;
mod drop_detection;
mod ewma;
mod idle_decay;
mod state;

use std::{
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use chrono::{DateTime, Utc};

use crate::time;

pub use classifier::{classify, VolumeClass};
pub use config::*;
pub use state::PollingSnapshot;

use state::PollingState;

/// Decides how long each poll of a queue should wait for messages.
///
/// This struct is cheaply clonable; clones share the same state so several workers polling
/// the same queue can use one controller. All state lives behind a single lock and every
/// observation is applied atomically.
#[derive(Clone, Debug)]
pub struct AdaptivePollingController {
    config: Arc<PollingConfig>,
    state: Arc<RwLock<PollingState>>,
}

impl AdaptivePollingController {
    /// Create a controller with adaptive polling disabled. Call [`Self::enable`] to start
    /// adapting wait times.
    pub fn new(config: PollingConfig) -> Self {
        Self::with_enabled(config, false)
    }

    pub fn with_enabled(config: PollingConfig, enabled: bool) -> Self {
        Self {
            config: Arc::new(config),
            state: Arc::new(RwLock::new(PollingState::new(enabled))),
        }
    }

    pub fn config(&self) -> &PollingConfig {
        &self.config
    }

    // Every critical section leaves the state consistent, so a panic elsewhere while holding
    // the lock does not make the data unusable.
    fn read(&self) -> RwLockReadGuard<'_, PollingState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PollingState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn enable(&self) {
        let mut state = self.write();
        if !state.enabled {
            tracing::info!("Enabling adaptive polling");
            state.enabled = true;
        }
    }

    /// Stop adapting wait times. The learned volume is kept and picked up again by
    /// [`Self::enable`].
    pub fn disable(&self) {
        let mut state = self.write();
        if state.enabled {
            tracing::info!("Disabling adaptive polling");
            state.enabled = false;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.read().enabled
    }

    /// The wait time to request on the next poll.
    pub fn next_wait_time(&self) -> Duration {
        let state = self.read();

        if state.enabled {
            classify(state.average, &self.config)
        } else {
            self.config.disabled_wait
        }
    }

    /// The volume tier of the current average, regardless of whether adaptive polling is
    /// enabled.
    pub fn volume_class(&self) -> VolumeClass {
        VolumeClass::from_average(self.read().average, &self.config)
    }

    pub fn average(&self) -> f64 {
        self.read().average
    }

    pub fn snapshot(&self) -> PollingSnapshot {
        self.read().snapshot()
    }

    /// Record the number of messages returned by a completed poll.
    pub fn observe(&self, message_count: usize) {
        let mut state = self.write();
        // Read under the lock so commits happen in timestamp order
        let now = time::now();

        self.observe_locked(&mut state, message_count, now);
    }

    pub fn observe_at(&self, message_count: usize, now: DateTime<Utc>) {
        let mut state = self.write();

        self.observe_locked(&mut state, message_count, now);
    }

    fn observe_locked(
        &self,
        state: &mut PollingState,
        message_count: usize,
        now: DateTime<Utc>,
    ) {
        if !state.enabled {
            tracing::trace!(message_count, "Adaptive polling disabled, ignoring observation");
            return;
        }

        if message_count == 0 {
            if let Some(decay) = idle_decay::decay_on_empty(
                state,
                self.config.consecutive_empty_threshold,
                self.config.decay_half_life,
                now,
            ) {
                tracing::debug!(
                    decay,
                    average = state.average,
                    consecutive_empty_count = state.consecutive_empty_count,
                    "Decayed message volume average"
                );
            }
            return;
        }

        state.consecutive_empty_count = 0;
        state.average = ewma::update(state.average, message_count, self.config.alpha);
        state.last_update_time = Some(now);

        let reset = drop_detection::detect_drop(
            state,
            message_count,
            self.config.drop_detection_threshold,
            now,
        );

        if reset {
            tracing::debug!("Sustained low volume, reset message volume average");
        }

        tracing::trace!(
            message_count,
            average = state.average,
            low_volume_cycle_count = state.low_volume_cycle_count,
            "Updated message volume average"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    const EPSILON: f64 = 1e-9;

    fn enabled_controller() -> AdaptivePollingController {
        AdaptivePollingController::with_enabled(PollingConfig::default(), true)
    }

    #[test]
    fn first_observation_selects_medium_wait() {
        let controller = enabled_controller();
        assert_eq!(controller.next_wait_time(), Duration::from_secs(20));

        controller.observe(10);

        assert!((controller.average() - 3.0).abs() < EPSILON);
        assert_eq!(controller.volume_class(), VolumeClass::Medium);
        assert_eq!(controller.next_wait_time(), Duration::from_secs(10));
    }

    #[test]
    fn spike_is_clamped_through_the_controller() {
        let controller = enabled_controller();
        controller.write().average = 1.0;

        controller.observe(100);

        assert!((controller.average() - 1.6).abs() < EPSILON);
    }

    #[test]
    fn idle_queue_decays_back_to_idle_wait() {
        let controller = enabled_controller();
        let start = time::now();

        controller.observe_at(10, start);
        assert!((controller.average() - 3.0).abs() < EPSILON);

        controller.observe_at(0, start + ChronoDuration::seconds(1));
        assert!((controller.average() - 3.0).abs() < EPSILON);

        controller.observe_at(0, start + ChronoDuration::seconds(35));
        let expected = 3.0 * 0.5_f64.powf(35.0 / 30.0);
        assert!((controller.average() - expected).abs() < EPSILON);
        assert_eq!(controller.next_wait_time(), Duration::from_secs(15));

        controller.observe_at(0, start + ChronoDuration::seconds(120));
        assert_eq!(controller.average(), 0.0);
        assert_eq!(controller.next_wait_time(), Duration::from_secs(20));
    }

    #[test]
    fn empty_polls_do_not_touch_low_volume_cycles() {
        let controller = enabled_controller();
        let now = time::now();

        for _ in 0..3 {
            controller.observe_at(1, now);
        }
        for _ in 0..3 {
            controller.observe_at(0, now);
        }

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.low_volume_cycle_count, 3);
        assert_eq!(snapshot.consecutive_empty_count, 3);

        // A single message clears the empty run but extends the low volume run
        controller.observe_at(1, now);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.low_volume_cycle_count, 4);
        assert_eq!(snapshot.consecutive_empty_count, 0);
    }

    #[test]
    fn sustained_low_volume_resets_average() {
        let controller = enabled_controller();
        let now = time::now();

        for _ in 0..9 {
            controller.observe_at(1, now);
            assert!(controller.average() < 1.0);
        }
        assert!(controller.average() > 0.0);

        controller.observe_at(1, now);

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.average, 0.0);
        assert_eq!(snapshot.low_volume_cycle_count, 0);
        assert_eq!(snapshot.last_reset_time, Some(now));

        // Another run inside the same minute does not reset again
        for _ in 0..10 {
            controller.observe_at(1, now + ChronoDuration::seconds(30));
        }
        let snapshot = controller.snapshot();
        assert!(snapshot.average > 0.0);
        assert_eq!(snapshot.low_volume_cycle_count, 10);
    }

    #[test]
    fn enable_and_disable_preserve_state() {
        let controller = enabled_controller();
        controller.observe(10);
        controller.observe(1);

        let before = controller.snapshot();

        controller.enable();
        controller.disable();
        assert!(!controller.is_enabled());
        assert_eq!(controller.next_wait_time(), Duration::ZERO);

        controller.disable();
        controller.enable();
        controller.enable();
        assert!(controller.is_enabled());

        assert_eq!(controller.snapshot(), before);
        assert_eq!(controller.next_wait_time(), Duration::from_secs(10));
    }

    #[test]
    fn disabled_controller_ignores_observations() {
        let config = PollingConfig::builder()
            .disabled_wait_seconds(20)
            .build()
            .unwrap();
        let controller = AdaptivePollingController::new(config);
        assert!(!controller.is_enabled());

        controller.observe(50);
        controller.observe(0);

        assert_eq!(controller.average(), 0.0);
        assert_eq!(controller.snapshot().consecutive_empty_count, 0);
        assert_eq!(controller.next_wait_time(), Duration::from_secs(20));
    }

    #[test]
    fn clones_share_state() {
        let controller = enabled_controller();
        let other = controller.clone();

        other.observe(10);
        assert!((controller.average() - 3.0).abs() < EPSILON);

        controller.disable();
        assert!(!other.is_enabled());
    }

    #[test]
    fn concurrent_observations_commit_in_time_order() {
        let controller = enabled_controller();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let controller = controller.clone();
                scope.spawn(move || {
                    for _ in 0..500 {
                        controller.observe(3);
                    }
                });
            }

            let reader = controller.clone();
            scope.spawn(move || {
                let mut previous = None;
                for _ in 0..2_000 {
                    let last_update_time = reader.snapshot().last_update_time;
                    assert!(last_update_time >= previous);
                    previous = last_update_time;
                }
            });
        });

        assert!(controller.snapshot().last_update_time.is_some());
    }

    #[test]
    fn concurrent_observations_are_not_lost() {
        let controller = enabled_controller();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let controller = controller.clone();
                scope.spawn(move || {
                    for _ in 0..50 {
                        controller.observe(0);
                        let _ = controller.next_wait_time();
                    }
                });
            }
        });

        assert_eq!(controller.snapshot().consecutive_empty_count, 400);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let controller = controller.clone();
                scope.spawn(move || {
                    for _ in 0..100 {
                        controller.observe(12);
                    }
                });
            }
        });

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.consecutive_empty_count, 0);
        assert!((snapshot.average - 12.0).abs() < 1e-6);
        assert_eq!(controller.next_wait_time(), Duration::from_secs(1));
    }
}
