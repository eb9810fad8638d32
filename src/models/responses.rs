//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::cache::template::TIMESTAMP_FORMAT;
use crate::cache::CacheStats;
use crate::gate::JailState;

/// Response body for GET /links/:fingerprint
#[derive(Debug, Clone, Serialize)]
pub struct LinksResponse {
    /// Fingerprint of the feed
    pub fingerprint: String,
    /// Number of stored links
    pub count: usize,
    /// The stored links, in insertion order
    pub links: Vec<Value>,
}

impl LinksResponse {
    /// Creates a LinksResponse from whatever is stored under the fingerprint.
    ///
    /// A non-sequence value is reported as a single entry.
    pub fn new(fingerprint: impl Into<String>, stored: &Value) -> Self {
        let links = match stored {
            Value::Array(items) => items.clone(),
            other => vec![other.clone()],
        };
        Self {
            fingerprint: fingerprint.into(),
            count: links.len(),
            links,
        }
    }
}

/// Response body for GET /jail and POST /jail/release
#[derive(Debug, Clone, Serialize)]
pub struct JailResponse {
    /// Whether logins are suspended
    pub locked: bool,
    /// When the current state began
    pub since: String,
}

impl From<JailState> for JailResponse {
    fn from(state: JailState) -> Self {
        Self {
            locked: state.locked,
            since: state.since.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

/// Response body for POST /dedupe
#[derive(Debug, Clone, Serialize)]
pub struct DedupeResponse {
    /// Number of duplicate elements removed
    pub removed: usize,
    /// Links left in the cache
    pub links: usize,
}

/// Response body for POST /clean
#[derive(Debug, Clone, Serialize)]
pub struct CleanResponse {
    /// Number of link lists evicted
    pub removed: usize,
    /// Feeds whose link lists were kept
    pub feeds: Vec<String>,
}

/// Response body for POST /reset/:key and POST /save
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn reset(key: &str) -> Self {
        Self {
            message: format!("Key '{}' reset to its default", key),
        }
    }

    pub fn saved(path: &Path, dry_run: bool) -> Self {
        let message = if dry_run {
            format!("Dry run, {} left untouched", path.display())
        } else {
            format!("Cache saved to {}", path.display())
        };
        Self { message }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Counters for the current run
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Lookup hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Links recorded across all feeds
    pub links: usize,
}

impl StatsResponse {
    pub fn new(stats: CacheStats, links: usize) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
            links,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Whether snapshot writes are suppressed
    pub dry_run: bool,
}

impl HealthResponse {
    pub fn healthy(dry_run: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            dry_run,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
