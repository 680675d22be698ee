//! Per-sender sliding window rate limiting (anti-ban throttling).

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Window length for the per-sender counter.
const WINDOW: Duration = Duration::from_secs(60);

struct SenderWindow {
    count: u32,
    started: Instant,
}

/// Decides whether an inbound message from a sender is admitted or dropped.
///
/// One window per distinct sender. The window restarts whenever more than
/// [`WINDOW`] has elapsed since it opened; within a window, every call
/// increments the counter (rejected messages count too, so a spammer's
/// window never resets early).
pub struct RateLimiter {
    enabled: bool,
    max_per_minute: u32,
    windows: HashMap<String, SenderWindow>,
}

impl RateLimiter {
    pub fn new(enabled: bool, max_per_minute: u32) -> Self {
        Self {
            enabled,
            max_per_minute,
            windows: HashMap::new(),
        }
    }

    /// Returns true if the message should be handled, false if it must be
    /// silently dropped. Callers must not reply on rejection.
    pub fn admit(&mut self, sender: &str, now: Instant) -> bool {
        if !self.enabled {
            return true;
        }

        match self.windows.get_mut(sender) {
            None => {
                self.windows.insert(
                    sender.to_string(),
                    SenderWindow { count: 1, started: now },
                );
                true
            }
            Some(window) => {
                if now.duration_since(window.started) > WINDOW {
                    window.count = 1;
                    window.started = now;
                    true
                } else {
                    window.count += 1;
                    window.count <= self.max_per_minute
                }
            }
        }
    }

    /// Drop windows that have fully elapsed. Called periodically so the map
    /// doesn't grow with every sender seen over the process lifetime.
    pub fn sweep(&mut self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.duration_since(w.started) <= WINDOW);
        before - self.windows.len()
    }

    #[cfg(test)]
    fn tracked_senders(&self) -> usize {
        self.windows.len()
    }
}
