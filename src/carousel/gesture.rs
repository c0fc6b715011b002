/// Touch sample tracking for the swipe gesture
///
/// Keeps the first and the most recent sample of an in-progress drag.
/// Velocity is measured over the whole gesture (start to last-seen), in
/// pixels per millisecond.
use std::time::Instant;

use crate::config::ViewerConfig;

#[derive(Debug, Clone, Copy)]
struct Sample {
    x: f32,
    at: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct GestureTracker {
    start: Option<Sample>,
    last: Option<Sample>,
}

impl GestureTracker {
    pub fn begin(&mut self, x: f32, at: Instant) {
        let sample = Sample { x, at };
        self.start = Some(sample);
        self.last = Some(sample);
    }

    /// Record a move and return the displacement from the start sample
    pub fn track(&mut self, x: f32, at: Instant) -> Option<f32> {
        let start = self.start?;
        self.last = Some(Sample { x, at });
        Some(x - start.x)
    }

    /// Average speed of the gesture in px/ms
    pub fn velocity(&self) -> f32 {
        let (Some(start), Some(last)) = (self.start, self.last) else {
            return 0.0;
        };
        let distance = (last.x - start.x).abs();
        let elapsed_ms = last.at.saturating_duration_since(start.at).as_secs_f32() * 1000.0;
        if distance == 0.0 {
            0.0
        } else if elapsed_ms == 0.0 {
            f32::INFINITY
        } else {
            distance / elapsed_ms
        }
    }

    pub fn reset(&mut self) {
        self.start = None;
        self.last = None;
    }
}

/// Whether a released drag moves to the neighbouring page.
///
/// Both thresholds are strict: a drag of exactly the ratio of the
/// viewport, or exactly the momentum threshold, does not commit.
pub fn should_commit(drag_offset: f32, viewport_width: f32, velocity: f32, config: &ViewerConfig) -> bool {
    let distance_threshold = viewport_width * config.distance_ratio;
    let has_momentum = velocity > config.momentum_threshold;
    drag_offset.abs() > distance_threshold || has_momentum
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_velocity_over_whole_gesture() {
        let t0 = Instant::now();
        let mut tracker = GestureTracker::default();
        tracker.begin(300.0, t0);
        tracker.track(280.0, t0 + Duration::from_millis(10));
        assert_eq!(tracker.track(260.0, t0 + Duration::from_millis(50)), Some(-40.0));

        assert!((tracker.velocity() - 0.8).abs() < 1e-3);
    }

    #[test]
    fn test_track_without_begin_is_ignored() {
        let mut tracker = GestureTracker::default();
        assert_eq!(tracker.track(10.0, Instant::now()), None);
        assert_eq!(tracker.velocity(), 0.0);
    }

    #[test]
    fn test_stationary_touch_has_no_velocity() {
        let t0 = Instant::now();
        let mut tracker = GestureTracker::default();
        tracker.begin(100.0, t0);
        tracker.track(100.0, t0);
        assert_eq!(tracker.velocity(), 0.0);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let config = ViewerConfig::default();
        assert!(!should_commit(200.0, 400.0, 0.2, &config));
        assert!(should_commit(200.5, 400.0, 0.2, &config));
        assert!(!should_commit(40.0, 400.0, 0.5, &config));
        assert!(should_commit(40.0, 400.0, 0.51, &config));
    }

    #[test]
    fn test_reset_clears_samples() {
        let mut tracker = GestureTracker::default();
        tracker.begin(1.0, Instant::now());
        tracker.reset();
        assert_eq!(tracker.track(5.0, Instant::now()), None);
        assert_eq!(tracker.velocity(), 0.0);
    }
}
