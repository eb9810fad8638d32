//! Crawl Report

use std::ops::AddAssign;

use serde::Serialize;

/// Tally of one crawl pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlReport {
    /// Items handed to the forwarder and recorded
    pub forwarded: usize,
    /// Items recorded without forwarding (cache-only, discussion posts)
    pub recorded: usize,
    /// Items already in the cache, or held back by a dry run
    pub skipped: usize,
    /// Items that failed to fetch or forward
    pub failed: usize,
    /// Feeds that could not be parsed
    pub feeds_failed: usize,
    /// Outcome of the end-of-run save; `None` when no save was needed
    pub saved: Option<bool>,
}

impl CrawlReport {
    /// True if the pass changed anything worth saving.
    pub fn has_changes(&self) -> bool {
        self.forwarded > 0 || self.recorded > 0
    }
}

impl AddAssign for CrawlReport {
    fn add_assign(&mut self, other: Self) {
        self.forwarded += other.forwarded;
        self.recorded += other.recorded;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.feeds_failed += other.feeds_failed;
        self.saved = match (self.saved, other.saved) {
            (Some(ours), Some(theirs)) => Some(ours && theirs),
            (ours, theirs) => ours.or(theirs),
        };
    }
}
