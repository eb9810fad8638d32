//! Configuration Module
//!
//! Handles loading run configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// File name of the cache snapshot inside `cache_dir`.
pub const SNAPSHOT_FILE: &str = "feedstash.json";

const DEFAULT_JAIL_COOLDOWN_HOURS: i64 = 24;

/// Credentials used to log in to a gated feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

/// A feed that sits behind a login and is subject to the access gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatedFeed {
    /// Short name used for grouping output
    pub name: String,
    /// Host name of the publication, e.g. `example.substack.com`
    pub domain: String,
    pub credentials: Credentials,
}

/// Operator supplied login URL for a domain, used to bypass the jail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOverride {
    pub domain: String,
    pub url: String,
}

/// Run configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the cache snapshot
    pub cache_dir: PathBuf,
    /// Never persist anything and never forward
    pub dry_run: bool,
    /// Record links without forwarding them
    pub cache_only: bool,
    /// Evict cached links of feeds that are no longer configured
    pub clean: bool,
    /// Restore the `links` subtree to its default on startup
    pub reset: bool,
    /// Dedupe the cache on startup
    pub dedupe: bool,
    /// Admin HTTP port
    pub server_port: u16,
    /// Snapshot flush interval in seconds
    pub flush_interval: u64,
    /// Base pause between consecutive login attempts, in seconds
    pub login_pause_secs: u64,
    /// How many times a submitted login is polled before giving up
    pub login_poll_budget: u32,
    /// Delay between login polls in milliseconds
    pub login_poll_interval_ms: u64,
    /// How long the jail holds after a failed login, in hours
    pub jail_cooldown_hours: i64,
    /// Notification target (device name, channel, ...)
    pub notify_target: String,
    /// Plain RSS feeds, by host name
    pub rss_feeds: Vec<String>,
    /// Feeds that require a login
    pub gated_feeds: Vec<GatedFeed>,
    /// Operator login URLs
    pub login_overrides: Vec<LoginOverride>,
    /// Disable ANSI colors in log output
    pub no_color: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DIR` - Snapshot directory (default: `$HOME/.cache`)
    /// - `DRY_RUN`, `CACHE_ONLY`, `CLEAN`, `RESET`, `DEDUPE`, `NO_COLOR` - Flags
    /// - `SERVER_PORT` - Admin HTTP port (default: 8424)
    /// - `FLUSH_INTERVAL` - Snapshot flush interval in seconds (default: 60)
    /// - `LOGIN_PAUSE_SECS` - Base login pause (default: 60)
    /// - `LOGIN_POLL_BUDGET` - Login polls before giving up (default: 30)
    /// - `LOGIN_POLL_INTERVAL_MS` - Delay between polls (default: 1000)
    /// - `JAIL_COOLDOWN_HOURS` - Jail duration (default: 24)
    /// - `NOTIFY_TARGET` - Notification target (default: "default")
    /// - `RSS_FEEDS` - Comma separated host names
    /// - `GATED_FEEDS` - Comma separated `name=domain` pairs
    /// - `GATED_LOGIN`, `GATED_PASSWORD` - Credentials for gated feeds
    /// - `GATED_LOGIN_<NAME>`, `GATED_PASSWORD_<NAME>` - Per-feed credentials
    /// - `LOGIN_OVERRIDES` - Comma separated `domain;url` pairs
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a Config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let flag = |key: &str| {
            lookup(key)
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false)
        };

        let credentials = Credentials {
            login: lookup("GATED_LOGIN").unwrap_or_default(),
            password: lookup("GATED_PASSWORD").unwrap_or_default(),
        };

        Self {
            cache_dir: lookup("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            dry_run: flag("DRY_RUN"),
            cache_only: flag("CACHE_ONLY"),
            clean: flag("CLEAN"),
            reset: flag("RESET"),
            dedupe: flag("DEDUPE"),
            server_port: parse_var(&lookup, "SERVER_PORT").unwrap_or(defaults.server_port),
            flush_interval: parse_var(&lookup, "FLUSH_INTERVAL").unwrap_or(defaults.flush_interval),
            login_pause_secs: parse_var(&lookup, "LOGIN_PAUSE_SECS").unwrap_or(defaults.login_pause_secs),
            login_poll_budget: parse_var(&lookup, "LOGIN_POLL_BUDGET").unwrap_or(defaults.login_poll_budget),
            login_poll_interval_ms: parse_var(&lookup, "LOGIN_POLL_INTERVAL_MS")
                .unwrap_or(defaults.login_poll_interval_ms),
            jail_cooldown_hours: parse_var(&lookup, "JAIL_COOLDOWN_HOURS")
                .unwrap_or(defaults.jail_cooldown_hours),
            notify_target: lookup("NOTIFY_TARGET").unwrap_or(defaults.notify_target),
            rss_feeds: lookup("RSS_FEEDS")
                .map(|v| split_list(&v).map(str::to_string).collect())
                .unwrap_or_default(),
            gated_feeds: lookup("GATED_FEEDS")
                .map(|v| parse_gated_feeds(&v, &lookup, &credentials))
                .unwrap_or_default(),
            login_overrides: lookup("LOGIN_OVERRIDES")
                .map(|v| parse_login_overrides(&v))
                .unwrap_or_default(),
            no_color: flag("NO_COLOR"),
        }
    }

    /// Full path of the cache snapshot.
    pub fn snapshot_path(&self) -> PathBuf {
        self.cache_dir.join(SNAPSHOT_FILE)
    }

    pub fn login_pause(&self) -> Duration {
        Duration::from_secs(self.login_pause_secs)
    }

    pub fn login_poll_interval(&self) -> Duration {
        Duration::from_millis(self.login_poll_interval_ms)
    }

    /// Jail cooldown; out of range or negative hours fall back to the default.
    pub fn jail_cooldown(&self) -> chrono::Duration {
        match chrono::Duration::try_hours(self.jail_cooldown_hours) {
            Some(cooldown) if self.jail_cooldown_hours >= 0 => cooldown,
            _ => {
                warn!(
                    "JAIL_COOLDOWN_HOURS={} is out of range, using {}",
                    self.jail_cooldown_hours, DEFAULT_JAIL_COOLDOWN_HOURS
                );
                chrono::Duration::hours(DEFAULT_JAIL_COOLDOWN_HOURS)
            }
        }
    }

    /// Every feed identifier whose links should survive a clean.
    pub fn configured_feeds(&self) -> Vec<String> {
        self.rss_feeds
            .iter()
            .cloned()
            .chain(self.gated_feeds.iter().map(|f| f.domain.clone()))
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."));
        Self {
            cache_dir: home.join(".cache"),
            dry_run: false,
            cache_only: false,
            clean: false,
            reset: false,
            dedupe: false,
            server_port: 8424,
            flush_interval: 60,
            login_pause_secs: 60,
            login_poll_budget: 30,
            login_poll_interval_ms: 1000,
            jail_cooldown_hours: DEFAULT_JAIL_COOLDOWN_HOURS,
            notify_target: "default".to_string(),
            rss_feeds: Vec::new(),
            gated_feeds: Vec::new(),
            login_overrides: Vec::new(),
            no_color: false,
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_gated_feeds<F>(raw: &str, lookup: &F, shared: &Credentials) -> Vec<GatedFeed>
where
    F: Fn(&str) -> Option<String>,
{
    split_list(raw)
        .filter_map(|item| match item.split_once('=') {
            Some((name, domain)) if !domain.trim().is_empty() => {
                let name = name.trim();
                let credentials = Credentials {
                    login: lookup(&feed_var("GATED_LOGIN", name))
                        .unwrap_or_else(|| shared.login.clone()),
                    password: lookup(&feed_var("GATED_PASSWORD", name))
                        .unwrap_or_else(|| shared.password.clone()),
                };
                Some(GatedFeed {
                    name: name.to_string(),
                    domain: domain.trim().to_string(),
                    credentials,
                })
            }
            _ => {
                warn!("Ignoring malformed gated feed entry {:?}", item);
                None
            }
        })
        .collect()
}

/// `GATED_LOGIN` + `my-letters` -> `GATED_LOGIN_MY_LETTERS`
fn feed_var(prefix: &str, name: &str) -> String {
    let suffix: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("{}_{}", prefix, suffix)
}

fn parse_login_overrides(raw: &str) -> Vec<LoginOverride> {
    split_list(raw)
        .filter_map(|item| match item.split_once(';') {
            Some((domain, url)) if !url.trim().is_empty() => Some(LoginOverride {
                domain: domain.trim().to_string(),
                url: url.trim().to_string(),
            }),
            _ => {
                warn!("Ignoring malformed login override {:?}", item);
                None
            }
        })
        .collect()
}
