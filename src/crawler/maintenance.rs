//! Startup Maintenance
//!
//! Housekeeping run before a crawl: evicting links of feeds no longer
//! configured, resetting the link store, and deduping.

use serde::Serialize;
use tracing::{info, warn};

use crate::cache::{CachePath, PathCache, LINKS_KEY};
use crate::config::Config;
use crate::error::Result;
use crate::fingerprint::fingerprint;

/// What a maintenance pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    /// Link lists evicted by `clean`
    pub cleaned: Option<usize>,
    pub reset: bool,
    /// Duplicates removed by `dedupe`
    pub deduped: Option<usize>,
}

/// Runs the housekeeping steps enabled in `config`.
///
/// Failures are logged and the remaining steps still run.
pub fn run(cache: &mut PathCache, config: &Config) -> MaintenanceReport {
    let mut report = MaintenanceReport::default();

    if config.clean {
        match clean_links(cache, &config.configured_feeds()) {
            Ok(removed) => report.cleaned = Some(removed),
            Err(err) => warn!("Could not clean links: {}", err),
        }
    }

    if config.reset {
        if !config.cache_only {
            warn!("Resetting links without cache-only mode, every item will be forwarded again");
        }
        match cache.reset(LINKS_KEY) {
            Ok(()) => report.reset = true,
            Err(err) => warn!("Could not reset links: {}", err),
        }
    }

    if config.dedupe {
        info!("Deduping cache");
        report.deduped = Some(cache.dedupe());
        info!("{} links in cache", cache.link_count());
    }

    report
}

/// Drops the link lists of every feed not in `feeds`.
pub fn clean_links<S: AsRef<str>>(cache: &mut PathCache, feeds: &[S]) -> Result<usize> {
    let known: Vec<String> = feeds.iter().map(|feed| fingerprint(feed.as_ref())).collect();
    cache.clean_key(known.as_slice(), &CachePath::root(LINKS_KEY))
}
