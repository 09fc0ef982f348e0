//! Invocation throttle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Sentinel for "never acquired".
const NEVER: u64 = u64::MAX;

/// Drops invocations that arrive within `window` of the last accepted one.
///
/// The timestamp is checked and updated in one atomic step, so two callers
/// racing inside the window cannot both be accepted.
#[derive(Debug)]
pub struct Cooldown {
    window: Duration,
    origin: Instant,
    last_micros: AtomicU64,
}

impl Cooldown {
    /// Throttle with the given window. A zero window accepts every call.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            origin: Instant::now(),
            last_micros: AtomicU64::new(NEVER),
        }
    }

    /// Minimum spacing between accepted calls.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Accept the call if the window has passed, recording now as the last call.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Same as [`Cooldown::try_acquire`] with an explicit clock reading.
    pub fn try_acquire_at(&self, now: Instant) -> bool {
        let now = micros(now.saturating_duration_since(self.origin));
        let window = micros(self.window);

        self.last_micros
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                (last == NEVER || now.saturating_sub(last) >= window).then_some(now)
            })
            .is_ok()
    }
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(NEVER - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_first_call_accepted() {
        let cooldown = Cooldown::new(Duration::from_millis(350));
        assert!(cooldown.try_acquire());
    }

    #[test]
    fn test_call_inside_window_dropped() {
        let cooldown = Cooldown::new(Duration::from_millis(350));
        let start = Instant::now();
        assert!(cooldown.try_acquire_at(start));
        assert!(!cooldown.try_acquire_at(start + Duration::from_millis(100)));
        assert!(!cooldown.try_acquire_at(start + Duration::from_millis(349)));
        assert!(cooldown.try_acquire_at(start + Duration::from_millis(350)));
    }

    #[test]
    fn test_dropped_call_does_not_extend_window() {
        let cooldown = Cooldown::new(Duration::from_millis(350));
        let start = Instant::now();
        assert!(cooldown.try_acquire_at(start));
        assert!(!cooldown.try_acquire_at(start + Duration::from_millis(300)));
        assert!(cooldown.try_acquire_at(start + Duration::from_millis(400)));
    }

    #[test]
    fn test_zero_window_accepts_all() {
        let cooldown = Cooldown::new(Duration::ZERO);
        let now = Instant::now();
        assert!(cooldown.try_acquire_at(now));
        assert!(cooldown.try_acquire_at(now));
    }

    #[test]
    fn test_concurrent_callers_single_winner() {
        let cooldown = Arc::new(Cooldown::new(Duration::from_secs(60)));
        let accepted = Arc::new(AtomicUsize::new(0));
        let now = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cooldown = Arc::clone(&cooldown);
                let accepted = Arc::clone(&accepted);
                std::thread::spawn(move || {
                    if cooldown.try_acquire_at(now) {
                        accepted.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            let _ = handle.join();
        }

        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }
}
