//! Bounded, newest-first log of notable simulation events.

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Simulated clock (ms since the view was mounted).
    pub at_ms: f64,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct EventLog {
    capacity: usize,
    entries: Vec<LogEntry>,
}

impl EventLog {
    pub const DEFAULT_CAPACITY: usize = 10;

    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Prepends `message`, dropping the oldest entry past capacity.
    pub fn push(&mut self, at_ms: f64, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(target: "vramsim::log", at_ms, %message);
        self.entries.insert(0, LogEntry { at_ms, message });
        self.entries.truncate(self.capacity);
    }

    /// Newest first.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_newest_ten_in_reverse_order() {
        let mut log = EventLog::default();
        for i in 0..15 {
            log.push(i as f64, format!("event {i}"));
        }
        assert_eq!(log.len(), 10);
        assert_eq!(log.latest().map(|e| e.message.as_str()), Some("event 14"));
        assert_eq!(log.entries()[9].message, "event 5");
    }

    #[test]
    fn clear_empties() {
        let mut log = EventLog::new(3);
        log.push(0.0, "a");
        log.clear();
        assert!(log.is_empty());
        assert!(log.latest().is_none());
    }
}
