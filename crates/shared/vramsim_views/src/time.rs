pub use core::time::Duration;

// `std::time::Instant::now()` can panic on `wasm32-unknown-unknown` depending on
// how the runtime is configured. `web-time` provides a browser-backed monotonic
// clock via `performance.now()`.
#[cfg(target_arch = "wasm32")]
pub use web_time::Instant;

#[cfg(not(target_arch = "wasm32"))]
pub use std::time::Instant;

/// Milliseconds since a view was mounted.
///
/// Interval callbacks get no timestamp of their own, so frame callbacks read
/// this clock too and ignore the browser's timestamp. Both kinds of callback
/// then see one timeline.
#[derive(Debug, Clone, Copy)]
pub struct MountClock {
    origin: Instant,
}

impl MountClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }

    pub fn elapsed(&self) -> Duration {
        Instant::now().duration_since(self.origin)
    }
}

impl Default for MountClock {
    fn default() -> Self {
        Self::start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_monotonic() {
        let c = MountClock::start();
        let a = c.now_ms();
        let b = c.now_ms();
        assert!(a >= 0.0);
        assert!(b >= a);
    }
}
