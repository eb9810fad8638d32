//! Cache Statistics Module
//!
//! Tracks path lookups and link bookkeeping for the admin surface.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache activity for the current run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of path lookups that found a value
    pub hits: u64,
    /// Number of path lookups that missed
    pub misses: u64,
    /// Number of values appended
    pub appends: u64,
    /// Number of unique appends skipped because the value was already present
    pub duplicates_skipped: u64,
    /// Number of duplicates removed by dedupe passes
    pub duplicates_removed: u64,
    /// Number of snapshot writes
    pub saves: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the lookup hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_append(&mut self) {
        self.appends += 1;
    }

    pub fn record_duplicate_skip(&mut self) {
        self.duplicates_skipped += 1;
    }

    pub fn record_dedupe(&mut self, removed: usize) {
        self.duplicates_removed += removed as u64;
    }

    pub fn record_save(&mut self) {
        self.saves += 1;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.appends, 0);
        assert_eq!(stats.saves, 0);
    }

    #[test]
    fn test_hit_rate_no_lookups() {
        assert_eq!(CacheStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_record_dedupe_accumulates() {
        let mut stats = CacheStats::new();
        stats.record_dedupe(2);
        stats.record_dedupe(3);
        assert_eq!(stats.duplicates_removed, 5);
    }
}
