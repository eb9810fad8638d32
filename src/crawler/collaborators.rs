//! Crawl Collaborators
//!
//! Seams to the outside world: feed fetching, browser sessions and the
//! read-later sink. Implementations live outside this crate.

use serde_json::Value;
use thiserror::Error;

use crate::config::Credentials;

/// One item of a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub link: String,
    pub title: Option<String>,
}

impl FeedEntry {
    pub fn new(link: impl Into<String>, title: Option<&str>) -> Self {
        Self {
            link: link.into(),
            title: title.map(str::to_string),
        }
    }
}

/// Result of fetching a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedFetch {
    Entries(Vec<FeedEntry>),
    /// The feed could not be parsed; carries the parser's complaint
    ParseFailed(String),
}

/// Fetches and parses feeds.
pub trait FeedSource {
    fn fetch(&mut self, feed: &str) -> FeedFetch;
}

/// An article page loaded through an authenticated session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Article {
    pub title: Option<String>,
    /// Only a teaser of a subscriber-only post was served
    pub excerpt_only: bool,
    /// Session cookies held after the page loaded
    pub cookies: Vec<Value>,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Error fetching {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Empty article {0}")]
    EmptyArticle(String),

    #[error("Missing article element, cannot parse {0}")]
    MissingArticle(String),

    #[error("Login form not found for {0}")]
    LoginForm(String),
}

/// A browser-like session able to log in and load gated pages.
pub trait SessionProvider {
    /// Loads `link` with `cookies` replayed and reports whether a paywall shows.
    fn is_paywalled(&mut self, domain: &str, link: &str, cookies: &[Value]) -> Result<bool, SessionError>;

    /// Fills in and submits the login form of `domain`.
    fn submit_login(&mut self, domain: &str, credentials: &Credentials) -> Result<(), SessionError>;

    /// True once the session shows the signed-in account state.
    fn logged_in(&mut self, domain: &str) -> bool;

    /// Image of the current page, for diagnostics.
    fn screenshot(&mut self) -> Option<Vec<u8>>;

    /// Opens an operator supplied login URL and returns the resulting cookies.
    fn custom_login(&mut self, domain: &str, url: &str) -> Result<Vec<Value>, SessionError>;

    /// Loads an article page.
    fn fetch_article(&mut self, domain: &str, link: &str) -> Result<Article, SessionError>;
}

#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("{0} did not load")]
    Unreachable(String),

    #[error("Error adding {link}: {reason}")]
    Rejected { link: String, reason: String },
}

/// Read-later or storage service receiving new articles.
pub trait Forwarder {
    fn forward(&mut self, feed: &str, link: &str, title: &str) -> Result<(), ForwardError>;
}
