//! feedstash - feed crawler state
//!
//! Persistent path cache of forwarded links, a login throttle for gated
//! feeds, the crawl driver, and a small admin API over both.
//!
//! Crawling is library-driven: feed fetching, browser sessions and the
//! read-later sink are traits in [`crawler`], implemented by the embedding
//! program, which then drives [`crawler::Crawler::run`]. The `feedstash`
//! binary only loads the cache, runs startup maintenance and serves the
//! admin API.

pub mod api;
pub mod cache;
pub mod config;
pub mod crawler;
pub mod error;
pub mod fingerprint;
pub mod gate;
pub mod models;
pub mod notify;
pub mod tasks;

pub use api::AppState;
pub use cache::{CachePath, PathCache};
pub use config::Config;
pub use gate::AccessGate;
pub use tasks::spawn_flush_task;
