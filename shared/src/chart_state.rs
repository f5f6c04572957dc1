use std::ops::Range;

/// Charts drawn before the first scroll; the rest wait for the user to scroll.
pub const EAGER_CHART_COUNT: usize = 24;

/// Eager/deferred chart rendering progress for one page load.
///
/// The deferred batch is handed out at most once; later calls get `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartState {
    pub eager_count: usize,
    pub all_rendered: bool,
}

impl Default for ChartState {
    fn default() -> Self {
        Self::new(EAGER_CHART_COUNT)
    }
}

impl ChartState {
    pub const fn new(eager_count: usize) -> Self {
        Self {
            eager_count,
            all_rendered: false,
        }
    }

    /// Indices to render as soon as panel markup is in the document.
    pub fn eager_range(&self, total: usize) -> Range<usize> {
        0..self.eager_count.min(total)
    }

    /// Indices to render on the first scroll. Marks everything rendered.
    pub fn take_deferred(&mut self, total: usize) -> Option<Range<usize>> {
        if self.all_rendered {
            return None;
        }
        self.all_rendered = true;
        Some(self.eager_count.min(total)..total)
    }
}

#[cfg(test)]
mod tests {
    use super::{ChartState, EAGER_CHART_COUNT};

    #[test]
    fn defaults_to_site_wide_threshold() {
        let state = ChartState::default();
        assert_eq!(state.eager_count, EAGER_CHART_COUNT);
        assert!(!state.all_rendered);
    }

    #[test]
    fn eager_batch_is_capped_by_record_count() {
        let state = ChartState::new(24);
        assert_eq!(state.eager_range(10), 0..10);
        assert_eq!(state.eager_range(30), 0..24);
        assert_eq!(state.eager_range(0), 0..0);
    }

    #[test]
    fn deferred_batch_is_handed_out_once() {
        let mut state = ChartState::new(24);
        assert_eq!(state.take_deferred(30), Some(24..30));
        assert!(state.all_rendered);
        for _ in 0..50 {
            assert_eq!(state.take_deferred(30), None);
        }
    }

    #[test]
    fn eager_and_deferred_cover_every_record_exactly_once() {
        for (total, threshold) in [(0, 24), (5, 24), (24, 24), (25, 24), (100, 3), (7, 0)] {
            let mut state = ChartState::new(threshold);
            let eager = state.eager_range(total);
            let deferred = state.take_deferred(total).expect("first scroll");
            assert_eq!(eager.len(), total.min(threshold));
            assert_eq!(deferred.len(), total.saturating_sub(threshold));
            let mut seen: Vec<usize> = eager.chain(deferred).collect();
            seen.dedup();
            assert_eq!(seen, (0..total).collect::<Vec<_>>());
        }
    }
}
