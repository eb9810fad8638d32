//! Cache Path Module
//!
//! Addresses a location inside the nested cache by an ordered key sequence.

use std::fmt;

use crate::cache::template::{JAIL_STATE_KEY, LINKS_KEY, SESSION_COOKIES_KEY};
use crate::error::{CacheError, Result};

// == Cache Path ==
/// Ordered, non-empty sequence of keys locating a value in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CachePath {
    segments: Vec<String>,
}

impl CachePath {
    /// Creates a single-segment path pointing at a top-level key.
    pub fn root(key: impl Into<String>) -> Self {
        Self {
            segments: vec![key.into()],
        }
    }

    /// Builds a path from any number of segments.
    ///
    /// Fails with `EmptyPath` when no segment is given.
    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(CacheError::EmptyPath);
        }
        Ok(Self { segments })
    }

    /// Returns a new path one level below this one.
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(key.into());
        Self { segments }
    }

    // == Well-known paths ==
    /// `links/<fingerprint>`
    pub fn links(fingerprint: impl Into<String>) -> Self {
        Self::root(LINKS_KEY).child(fingerprint)
    }

    /// `jail_state`
    pub fn jail_state() -> Self {
        Self::root(JAIL_STATE_KEY)
    }

    /// `session_cookies/<domain>`
    pub fn session_cookies(domain: impl Into<String>) -> Self {
        Self::root(SESSION_COOKIES_KEY).child(domain)
    }

    /// The top-level key of the path.
    pub fn head(&self) -> &str {
        &self.segments[0]
    }

    /// Every segment after the top-level key.
    pub fn tail(&self) -> &[String] {
        &self.segments[1..]
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false; a path holds at least one segment.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for CachePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl From<&str> for CachePath {
    fn from(key: &str) -> Self {
        Self::root(key)
    }
}

impl TryFrom<Vec<String>> for CachePath {
    type Error = CacheError;

    fn try_from(segments: Vec<String>) -> Result<Self> {
        Self::from_segments(segments)
    }
}
