//! Scoped time accumulation for pipeline operations.

use std::collections::BTreeMap;
use std::time::Instant;

/// Operations pre-registered on every tracker.
pub const DEFAULT_OPERATIONS: &[&str] =
    &["cache_prebuild", "complexity", "filechurn", "hotspot", "ownership", "sharedownership"];

/// Accumulates elapsed seconds per named operation. Scoped to one analysis
/// run and owned exclusively by it.
pub struct TimingTracker {
    timings: BTreeMap<String, f64>,
}

impl TimingTracker {
    pub fn new() -> Self {
        let timings = DEFAULT_OPERATIONS.iter().map(|op| (op.to_string(), 0.0)).collect();
        TimingTracker { timings }
    }

    /// Start a timing scope. Elapsed time is added to `operation`'s total when
    /// the returned guard drops, whether or not the scope exits normally.
    /// Unknown operations are registered on first use.
    pub fn track(&mut self, operation: &str) -> TimingScope<'_> {
        TimingScope { tracker: self, operation: operation.to_string(), start: Instant::now() }
    }

    /// A defensive copy of the accumulated timings.
    pub fn get_timings(&self) -> BTreeMap<String, f64> {
        self.timings.clone()
    }

    /// Zero all registered operations.
    pub fn reset(&mut self) {
        for value in self.timings.values_mut() {
            *value = 0.0;
        }
    }

    fn add(&mut self, operation: &str, seconds: f64) {
        *self.timings.entry(operation.to_string()).or_insert(0.0) += seconds;
    }
}

impl Default for TimingTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard returned by [`TimingTracker::track`]; accumulates on drop.
pub struct TimingScope<'a> {
    tracker: &'a mut TimingTracker,
    operation: String,
    start: Instant,
}

impl Drop for TimingScope<'_> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed().as_secs_f64();
        self.tracker.add(&self.operation, elapsed);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_operations_registered() {
        let tracker = TimingTracker::new();
        let timings = tracker.get_timings();
        for op in DEFAULT_OPERATIONS {
            assert_eq!(timings.get(*op), Some(&0.0), "missing default op {op}");
        }
    }

    #[test]
    fn test_track_accumulates() {
        let mut tracker = TimingTracker::new();
        {
            let _scope = tracker.track("complexity");
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        let first = tracker.get_timings()["complexity"];
        assert!(first > 0.0);

        {
            let _scope = tracker.track("complexity");
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert!(tracker.get_timings()["complexity"] > first);
    }

    #[test]
    fn test_unknown_operation_registered_on_use() {
        let mut tracker = TimingTracker::new();
        {
            let _scope = tracker.track("custom_op");
        }
        assert!(tracker.get_timings().contains_key("custom_op"));
    }

    #[test]
    fn test_reset() {
        let mut tracker = TimingTracker::new();
        {
            let _scope = tracker.track("hotspot");
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        tracker.reset();
        assert_eq!(tracker.get_timings()["hotspot"], 0.0);
    }

    #[test]
    fn test_get_timings_returns_copy() {
        let tracker = TimingTracker::new();
        let mut copy = tracker.get_timings();
        copy.insert("complexity".to_string(), 999.0);
        assert_eq!(tracker.get_timings()["complexity"], 0.0);
    }
}
