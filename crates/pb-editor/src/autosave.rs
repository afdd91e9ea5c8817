//! Auto-save debouncer.
//!
//! Time is injected (`Instant` arguments) so callers drive it from their
//! event loop and tests drive it deterministically. Every edit re-arms the
//! deadline; the save fires once the page has been quiet for `delay`.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct AutoSave {
    delay: Duration,
    enabled: bool,
    deadline: Option<Instant>,
}

impl AutoSave {
    pub fn new(delay: Duration, enabled: bool) -> Self {
        Self {
            delay,
            enabled,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turning auto-save off drops any pending deadline.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.deadline = None;
        }
    }

    /// Re-arm the timer after an edit at `now`.
    pub fn schedule(&mut self, now: Instant) {
        if self.enabled {
            self.deadline = Some(now + self.delay);
        }
    }

    /// `true` exactly once per armed deadline, when `now` has reached it.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// When the pending save will fire.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn rapid_edits_fire_once_from_last_edit() {
        let t0 = Instant::now();
        let mut auto = AutoSave::new(3 * SECOND, true);
        auto.schedule(t0);
        auto.schedule(t0 + SECOND);

        assert!(!auto.poll(t0 + 3 * SECOND));
        assert!(!auto.poll(t0 + 3 * SECOND + Duration::from_millis(999)));
        assert!(auto.poll(t0 + 4 * SECOND));
        assert!(!auto.poll(t0 + 10 * SECOND));
    }

    #[test]
    fn disabled_never_fires() {
        let t0 = Instant::now();
        let mut auto = AutoSave::new(SECOND, false);
        auto.schedule(t0);
        assert!(!auto.is_pending());
        assert!(!auto.poll(t0 + 5 * SECOND));
    }

    #[test]
    fn cancel_and_disable_drop_pending() {
        let t0 = Instant::now();
        let mut auto = AutoSave::new(SECOND, true);
        auto.schedule(t0);
        auto.cancel();
        assert!(!auto.poll(t0 + 2 * SECOND));

        auto.schedule(t0);
        auto.set_enabled(false);
        assert!(!auto.poll(t0 + 2 * SECOND));
    }
}
