/// Eased horizontal offset for the carousel strip
///
/// The viewer state only knows the logical transform. This turns it into
/// the value drawn on screen: it follows the finger 1:1 while dragging and
/// eases (cubic ease-out) towards each new target otherwise.
use std::time::{Duration, Instant};

/// Targets closer than this are treated as unchanged
const EPSILON: f32 = 0.01;

#[derive(Debug, Clone)]
pub struct Transition {
    from: f32,
    to: f32,
    started: Option<Instant>,
    duration: Duration,
}

impl Transition {
    pub fn new(duration: Duration) -> Self {
        Self {
            from: 0.0,
            to: 0.0,
            started: None,
            duration,
        }
    }

    /// Displayed offset at `now`
    pub fn value(&self, now: Instant) -> f32 {
        let Some(started) = self.started else {
            return self.to;
        };
        if self.duration.is_zero() {
            return self.to;
        }
        let t = now.saturating_duration_since(started).as_secs_f32() / self.duration.as_secs_f32();
        if t >= 1.0 {
            self.to
        } else {
            self.from + (self.to - self.from) * ease_out(t)
        }
    }

    /// Move towards `target`, animated or as an immediate jump.
    ///
    /// An animated retarget starts from whatever is on screen at `now`, so
    /// interrupting a slide never jumps.
    pub fn retarget(&mut self, target: f32, animate: bool, now: Instant) {
        if animate {
            if (target - self.to).abs() < EPSILON {
                return;
            }
            self.from = self.value(now);
            self.to = target;
            self.started = Some(now);
        } else {
            self.from = target;
            self.to = target;
            self.started = None;
        }
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        match self.started {
            Some(started) => now.saturating_duration_since(started) < self.duration,
            None => false,
        }
    }
}

fn ease_out(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jump_when_not_animated() {
        let now = Instant::now();
        let mut transition = Transition::new(Duration::from_millis(300));
        transition.retarget(-416.0, false, now);
        assert_eq!(transition.value(now), -416.0);
        assert!(!transition.is_animating(now));
    }

    #[test]
    fn test_eases_to_target() {
        let now = Instant::now();
        let mut transition = Transition::new(Duration::from_millis(300));
        transition.retarget(-416.0, true, now);

        let halfway = transition.value(now + Duration::from_millis(150));
        assert!(halfway < 0.0 && halfway > -416.0);
        assert!(transition.is_animating(now + Duration::from_millis(150)));
        assert_eq!(transition.value(now + Duration::from_millis(300)), -416.0);
        assert!(!transition.is_animating(now + Duration::from_millis(300)));
    }

    #[test]
    fn test_retarget_mid_flight_starts_from_screen_value() {
        let now = Instant::now();
        let mut transition = Transition::new(Duration::from_millis(300));
        transition.retarget(-400.0, true, now);
        let mid = now + Duration::from_millis(100);
        let on_screen = transition.value(mid);

        transition.retarget(0.0, true, mid);
        assert!((transition.value(mid) - on_screen).abs() < 1e-3);
    }

    #[test]
    fn test_same_target_keeps_running() {
        let now = Instant::now();
        let mut transition = Transition::new(Duration::from_millis(300));
        transition.retarget(-400.0, true, now);
        transition.retarget(-400.0, true, now + Duration::from_millis(200));
        assert!(!transition.is_animating(now + Duration::from_millis(300)));
    }
}
