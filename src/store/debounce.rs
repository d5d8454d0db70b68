use std::time::{Duration, Instant};

/// Trailing-edge debounce with a single pending deadline.
///
/// Arming while already armed replaces the deadline, so only the last
/// trigger in a burst ever fires.
#[derive(Debug, Default, Clone)]
pub struct Debouncer {
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns `true` exactly once when the deadline has passed, disarming.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(500);

    #[test]
    fn fires_once_after_deadline() {
        let t0 = Instant::now();
        let mut d = Debouncer::new();
        d.arm(t0, DELAY);
        assert!(!d.fire_if_due(t0 + Duration::from_millis(499)));
        assert!(d.fire_if_due(t0 + DELAY));
        assert!(!d.fire_if_due(t0 + DELAY * 2));
        assert!(!d.is_armed());
    }

    #[test]
    fn rearming_pushes_the_deadline_back() {
        let t0 = Instant::now();
        let mut d = Debouncer::new();
        d.arm(t0, DELAY);
        d.arm(t0 + Duration::from_millis(400), DELAY);
        assert!(!d.fire_if_due(t0 + DELAY));
        assert!(d.fire_if_due(t0 + Duration::from_millis(900)));
    }

    #[test]
    fn cancel_disarms() {
        let t0 = Instant::now();
        let mut d = Debouncer::new();
        d.arm(t0, DELAY);
        d.cancel();
        assert!(!d.fire_if_due(t0 + DELAY * 4));
    }
}
