/// Number of loads currently in flight for one view.
///
/// Owned by the state that renders the spinner; there is no global counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadingTracker {
    in_flight: u32,
}

impl LoadingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) {
        self.in_flight = self.in_flight.saturating_add(1);
    }

    /// Unmatched calls are ignored rather than underflowing.
    pub fn end(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    pub fn in_flight(&self) -> u32 {
        self.in_flight
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_without_begin_stays_idle() {
        let mut tracker = LoadingTracker::new();
        tracker.end();
        assert_eq!(tracker.in_flight(), 0);

        tracker.begin();
        tracker.begin();
        tracker.end();
        assert!(tracker.is_loading());
        tracker.end();
        assert!(!tracker.is_loading());
    }
}
