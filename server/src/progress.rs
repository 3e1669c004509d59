use common::PROGRESS_UNITS_PER_FILE;

/// Accumulates progress units over a batch and turns them into a percentage.
///
/// The budget is fixed when the batch starts, from the number of selected files. Files skipped
/// later still count, so a batch with skips finishes below 100 %.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchProgressTracker {
    value: f64,
    max_value: f64,
}

impl BatchProgressTracker {
    pub fn new(file_count: usize) -> Self {
        Self {
            value: 0.0,
            max_value: PROGRESS_UNITS_PER_FILE * file_count as f64,
        }
    }

    /// Adds `units` and returns the new percentage. Negative increments are ignored.
    pub fn advance(&mut self, units: f64) -> f64 {
        if units > 0.0 {
            self.value += units;
        }
        self.percent()
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    /// Not clamped. An empty batch stays at 0.
    pub fn percent(&self) -> f64 {
        if self.max_value == 0.0 {
            return 0.0;
        }
        100.0 * self.value / self.max_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_tracker_starts_at_zero() {
        let tracker = BatchProgressTracker::new(3);
        assert_eq!(tracker.percent(), 0.0);
        assert_eq!(tracker.max_value(), 300.0);
    }

    #[test]
    fn one_of_four_files_is_a_quarter() {
        let mut tracker = BatchProgressTracker::new(4);
        for _ in 0..10 {
            tracker.advance(10.0);
        }
        assert!((tracker.percent() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn percentage_never_decreases() {
        let mut tracker = BatchProgressTracker::new(2);
        let mut last = tracker.percent();
        for units in [0.5, 0.0, -3.0, 12.25, 99.0] {
            let now = tracker.advance(units);
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn overshoot_is_not_clamped() {
        let mut tracker = BatchProgressTracker::new(1);
        assert_eq!(tracker.advance(150.0), 150.0);
    }

    #[test]
    fn empty_batch_does_not_divide_by_zero() {
        let mut tracker = BatchProgressTracker::new(0);
        assert_eq!(tracker.advance(1.0), 0.0);
    }
}
