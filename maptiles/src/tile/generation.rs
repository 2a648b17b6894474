//! Request generations for discarding stale tile deliveries.
//!
//! A view issues tile requests tagged with the current generation and
//! advances the generation whenever it moves on (pan, zoom). Fetches are
//! never cancelled, so results for older views keep arriving; a
//! [`GenerationFilter`] at the consumer drops anything older than the newest
//! generation it has already seen.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic request generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}

/// Source of generations for one view.
#[derive(Debug, Default)]
pub struct RequestGenerations {
    current: AtomicU64,
}

impl RequestGenerations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Generation {
        Generation(self.current.load(Ordering::Acquire))
    }

    /// Starts a new generation and returns it. The first call returns 1.
    pub fn advance(&self) -> Generation {
        Generation(self.current.fetch_add(1, Ordering::AcqRel) + 1)
    }
}

/// Delivery-time staleness check.
#[derive(Debug, Default)]
pub struct GenerationFilter {
    latest: AtomicU64,
}

impl GenerationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `generation` and reports whether its delivery should be kept.
    ///
    /// Returns false if a newer generation has already been observed.
    pub fn accept(&self, generation: Generation) -> bool {
        let previous = self.latest.fetch_max(generation.0, Ordering::AcqRel);
        generation.0 >= previous
    }

    pub fn latest(&self) -> Generation {
        Generation(self.latest.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_is_monotonic() {
        let generations = RequestGenerations::new();
        assert_eq!(generations.current(), Generation(0));
        assert_eq!(generations.advance(), Generation(1));
        assert_eq!(generations.advance(), Generation(2));
        assert_eq!(generations.current(), Generation(2));
    }

    #[test]
    fn test_filter_drops_older_generations() {
        let filter = GenerationFilter::new();

        assert!(filter.accept(Generation(1)));
        assert!(filter.accept(Generation(3)));
        assert!(!filter.accept(Generation(2)));
        assert!(filter.accept(Generation(3)));
        assert!(!filter.accept(Generation(1)));
        assert_eq!(filter.latest(), Generation(3));
    }

    #[test]
    fn test_display() {
        assert_eq!(Generation(7).to_string(), "gen#7");
    }

    #[test]
    fn test_concurrent_advance_yields_unique_values() {
        use std::collections::HashSet;
        use std::sync::Arc;

        let generations = Arc::new(RequestGenerations::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let g = Arc::clone(&generations);
                std::thread::spawn(move || (0..100).map(|_| g.advance()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for generation in handle.join().unwrap() {
                assert!(seen.insert(generation));
            }
        }
        assert_eq!(seen.len(), 800);
        assert_eq!(generations.current(), Generation(800));
    }
}
