//! Smoothed tokens-per-second from arrival timestamps.

/// Moving average of instantaneous rates (1 / inter-arrival time).
#[derive(Debug, Clone)]
pub struct ThroughputMeter {
    window: usize,
    samples: Vec<f64>,
    last_arrival_ms: Option<f64>,
}

impl ThroughputMeter {
    pub const DEFAULT_WINDOW: usize = 5;

    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            samples: Vec::with_capacity(window),
            last_arrival_ms: None,
        }
    }

    /// Records an arrival at `now_ms` and returns the smoothed rate.
    ///
    /// The first arrival only arms the meter. Non-increasing timestamps are
    /// ignored so a duplicate frame can't produce an infinite rate.
    pub fn record_arrival(&mut self, now_ms: f64) -> f64 {
        if let Some(last) = self.last_arrival_ms {
            let dt_s = (now_ms - last) / 1000.0;
            if dt_s <= 0.0 {
                return self.tokens_per_sec();
            }
            if self.samples.len() == self.window {
                self.samples.remove(0);
            }
            self.samples.push(1.0 / dt_s);
        }
        self.last_arrival_ms = Some(now_ms);
        self.tokens_per_sec()
    }

    pub fn tokens_per_sec(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.last_arrival_ms = None;
    }
}

impl Default for ThroughputMeter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_arrival_only_arms() {
        let mut m = ThroughputMeter::default();
        assert_eq!(m.record_arrival(1000.0), 0.0);
        assert!(m.samples().is_empty());
        assert_eq!(m.record_arrival(1500.0), 2.0);
    }

    #[test]
    fn averages_over_last_five_intervals() {
        let mut m = ThroughputMeter::default();
        let mut t = 0.0;
        m.record_arrival(t);
        // Five slow intervals (1 t/s), then five fast ones (4 t/s).
        for _ in 0..5 {
            t += 1000.0;
            m.record_arrival(t);
        }
        assert!((m.tokens_per_sec() - 1.0).abs() < 1e-9);
        for _ in 0..5 {
            t += 250.0;
            m.record_arrival(t);
        }
        assert_eq!(m.samples().len(), 5);
        assert!((m.tokens_per_sec() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn duplicate_timestamp_is_ignored() {
        let mut m = ThroughputMeter::default();
        m.record_arrival(100.0);
        m.record_arrival(200.0);
        let before = m.tokens_per_sec();
        assert_eq!(m.record_arrival(200.0), before);
        assert_eq!(m.samples().len(), 1);
    }

    #[test]
    fn reset_disarms() {
        let mut m = ThroughputMeter::default();
        m.record_arrival(0.0);
        m.record_arrival(100.0);
        m.reset();
        assert_eq!(m.tokens_per_sec(), 0.0);
        assert_eq!(m.record_arrival(5000.0), 0.0);
    }
}
