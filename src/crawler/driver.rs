//! Crawl Driver
//!
//! Walks the configured feeds, records new links in the cache and hands
//! them to the forwarder. Gated feeds go through the access gate before
//! any login is attempted.

use std::thread;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::cache::{CachePath, PathCache};
use crate::config::{Config, GatedFeed, LoginOverride};
use crate::crawler::{CrawlReport, FeedFetch, FeedSource, Forwarder, SessionProvider};
use crate::fingerprint::fingerprint;
use crate::gate::{AccessGate, LoginOutcome};

const UNTITLED: &str = "No Title";

// == Crawler ==
/// One crawl pass over a cache and a gate.
pub struct Crawler<'a, F, S, W> {
    cache: &'a mut PathCache,
    gate: &'a mut AccessGate,
    feeds: F,
    session: S,
    forwarder: W,
    dry_run: bool,
    cache_only: bool,
    poll_budget: u32,
    poll_interval: Duration,
}

impl<'a, F, S, W> Crawler<'a, F, S, W>
where
    F: FeedSource,
    S: SessionProvider,
    W: Forwarder,
{
    pub fn new(
        config: &Config,
        cache: &'a mut PathCache,
        gate: &'a mut AccessGate,
        feeds: F,
        session: S,
        forwarder: W,
    ) -> Self {
        Self {
            cache,
            gate,
            feeds,
            session,
            forwarder,
            dry_run: config.dry_run,
            cache_only: config.cache_only,
            poll_budget: config.login_poll_budget,
            poll_interval: config.login_poll_interval(),
        }
    }

    // == Full Pass ==
    /// Applies login overrides, crawls every configured feed and saves the
    /// cache if anything was recorded.
    pub fn run(&mut self, config: &Config) -> CrawlReport {
        self.apply_login_overrides(&config.login_overrides);

        let mut report = CrawlReport::default();
        for feed in &config.rss_feeds {
            report += self.crawl_feed(feed);
        }
        for feed in &config.gated_feeds {
            report += self.crawl_gated(feed);
        }

        if report.has_changes() || self.cache_only {
            report.saved = Some(self.cache.save().is_ok());
        }
        info!(
            "Crawl finished: {} forwarded, {} recorded, {} skipped, {} failed",
            report.forwarded, report.recorded, report.skipped, report.failed
        );
        report
    }

    // == Login Overrides ==
    /// Logs in through operator supplied URLs and stores the cookies.
    ///
    /// Any override releases the login jail first. Returns how many
    /// overrides produced a session.
    pub fn apply_login_overrides(&mut self, overrides: &[LoginOverride]) -> usize {
        if overrides.is_empty() {
            return 0;
        }
        self.gate.check_access(self.cache, "", true);

        let mut applied = 0;
        for login in overrides {
            info!("Adding custom login for {}", login.domain);
            match self.session.custom_login(&login.domain, &login.url) {
                Ok(cookies) => {
                    self.store_cookies(&login.domain, cookies);
                    self.gate.record_success(&login.domain);
                    applied += 1;
                }
                Err(err) => error!("Custom login for {} failed: {}", login.domain, err),
            }
        }
        applied
    }

    // == Plain Feeds ==
    /// Forwards the new items of an open feed.
    pub fn crawl_feed(&mut self, feed: &str) -> CrawlReport {
        let mut report = CrawlReport::default();
        let path = self.ensure_links_key(feed);

        let entries = match self.feeds.fetch(feed) {
            FeedFetch::Entries(entries) => entries,
            FeedFetch::ParseFailed(reason) => {
                error!("Error parsing feed {}: {}", feed, reason);
                report.feeds_failed += 1;
                return report;
            }
        };

        for entry in entries {
            let link = Value::String(entry.link.clone());
            if self.cache.has(&link, &path) {
                debug!("{} already cached", entry.link);
                report.skipped += 1;
                continue;
            }

            if self.cache_only {
                info!("Caching {} without forwarding", entry.link);
                self.record(link, &path, &mut report.recorded);
                continue;
            }
            if self.dry_run {
                info!("Dry run, not forwarding {}", entry.link);
                report.skipped += 1;
                continue;
            }

            let title = entry.title.as_deref().unwrap_or(UNTITLED);
            match self.forwarder.forward(feed, &entry.link, title) {
                Ok(()) => {
                    info!("Forwarded {}", entry.link);
                    self.record(link, &path, &mut report.forwarded);
                }
                Err(err) => {
                    error!("{}", err);
                    report.failed += 1;
                }
            }
        }
        report
    }

    // == Gated Feeds ==
    /// Fetches the new items of a feed that needs a logged-in session.
    pub fn crawl_gated(&mut self, feed: &GatedFeed) -> CrawlReport {
        let mut report = CrawlReport::default();
        let domain = feed.domain.as_str();
        let path = self.ensure_links_key(domain);

        let entries = match self.feeds.fetch(domain) {
            FeedFetch::Entries(entries) => entries,
            FeedFetch::ParseFailed(reason) => {
                error!("Error parsing feed {}: {}", domain, reason);
                report.feeds_failed += 1;
                return report;
            }
        };

        for entry in entries {
            let link = Value::String(entry.link.clone());
            if self.cache.has(&link, &path) {
                debug!("{} already cached", entry.link);
                report.skipped += 1;
                continue;
            }

            if is_discussion(&entry.link) {
                warn!("Skipping {}, not an article", entry.link);
                self.record(link, &path, &mut report.recorded);
                continue;
            }

            if self.cache_only {
                info!("Caching {} without fetching", entry.link);
                self.record(link, &path, &mut report.recorded);
                continue;
            }

            let title = match self.fetch_gated(feed, &entry.link) {
                Some(title) => title.or_else(|| entry.title.clone()),
                None => {
                    warn!("Fetch error occurred, not caching {}", entry.link);
                    report.failed += 1;
                    continue;
                }
            };

            if self.dry_run {
                info!("Dry run, not forwarding {}", entry.link);
                report.skipped += 1;
                continue;
            }

            let title = title.as_deref().unwrap_or(UNTITLED);
            match self.forwarder.forward(&feed.name, &entry.link, title) {
                Ok(()) => {
                    info!("Forwarded {}", entry.link);
                    self.record(link, &path, &mut report.forwarded);
                }
                Err(err) => {
                    error!("{}", err);
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Loads one gated article. Returns its title, or `None` on a fetch error.
    fn fetch_gated(&mut self, feed: &GatedFeed, link: &str) -> Option<Option<String>> {
        if !self.ensure_session(feed, link) {
            return None;
        }

        match self.session.fetch_article(&feed.domain, link) {
            Ok(article) => {
                if article.excerpt_only {
                    warn!("Only an excerpt of {} is available", link);
                }
                self.store_cookies(&feed.domain, article.cookies);
                Some(article.title)
            }
            Err(err) => {
                error!("{}", err);
                None
            }
        }
    }

    // == Session ==
    /// Makes sure `link` can be read, logging in when the page is paywalled.
    fn ensure_session(&mut self, feed: &GatedFeed, link: &str) -> bool {
        let domain = feed.domain.as_str();
        if self.gate.is_logged_in(domain) {
            return true;
        }

        let cookies = self.cached_cookies(domain);
        match self.session.is_paywalled(domain, link, &cookies) {
            Ok(false) => {
                // An open page says nothing about the account; the next
                // item is checked again.
                debug!("{} readable without logging in to {}", link, domain);
                true
            }
            Ok(true) if self.dry_run => {
                info!("Dry run, not logging in to {}", domain);
                true
            }
            Ok(true) => self.login(feed) == LoginOutcome::LoggedIn,
            Err(err) => {
                error!("{}", err);
                false
            }
        }
    }

    /// One paced login attempt through the gate.
    fn login(&mut self, feed: &GatedFeed) -> LoginOutcome {
        let domain = feed.domain.as_str();
        if self.gate.check_access(self.cache, domain, false) {
            info!("Stuck in login jail, not logging in to {}", domain);
            return LoginOutcome::Refused;
        }

        let pause = self.gate.next_pause();
        if !pause.is_zero() {
            info!("Pausing {}s before logging in to {}", pause.as_secs(), domain);
            thread::sleep(pause);
        }

        info!("Logging in to {}", domain);
        if let Err(err) = self.session.submit_login(domain, &feed.credentials) {
            warn!("{}", err);
        }

        for _ in 0..self.poll_budget {
            if self.session.logged_in(domain) {
                self.gate.record_success(domain);
                return LoginOutcome::LoggedIn;
            }
            thread::sleep(self.poll_interval);
        }

        let screenshot = self.session.screenshot();
        self.gate.record_failure(self.cache, domain, screenshot);
        LoginOutcome::Exhausted
    }

    // == Cache Helpers ==
    /// Path of the link list for `feed`, created empty when missing.
    fn ensure_links_key(&mut self, feed: &str) -> CachePath {
        let path = CachePath::links(fingerprint(feed));
        if !self.cache.has_key(&path) {
            info!("Adding new key for {}", feed);
            if let Err(err) = self.cache.set(Value::Array(Vec::new()), &path, false) {
                error!("{}", err);
            }
        }
        path
    }

    fn record(&mut self, link: Value, path: &CachePath, counter: &mut usize) {
        match self.cache.append_unique(link, path, false) {
            Ok(_) => *counter += 1,
            Err(err) => error!("{}", err),
        }
    }

    fn cached_cookies(&mut self, domain: &str) -> Vec<Value> {
        match self.cache.get(&CachePath::session_cookies(domain)) {
            Ok(Value::Array(cookies)) => cookies.clone(),
            _ => Vec::new(),
        }
    }

    fn store_cookies(&mut self, domain: &str, cookies: Vec<Value>) {
        if let Err(err) = self
            .cache
            .set(Value::Array(cookies), &CachePath::session_cookies(domain), false)
        {
            error!("{}", err);
        }
    }

    // == Accessors ==
    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn forwarder(&self) -> &W {
        &self.forwarder
    }
}

/// True for items that are not articles: comment pages, open threads,
/// videos, and slugs starting with a dash.
pub fn is_discussion(link: &str) -> bool {
    let slug = link
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    slug == "comments"
        || slug.starts_with('-')
        || slug.contains("open-thread")
        || slug.contains("video-")
}
