//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for POST /clean
///
/// Feeds whose links should be kept. An empty list keeps the feeds the
/// server was configured with.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CleanRequest {
    #[serde(default)]
    pub feeds: Vec<String>,
}

impl CleanRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.feeds.iter().any(|feed| feed.trim().is_empty()) {
            return Some("Feed cannot be empty".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_request_defaults_to_no_feeds() {
        let req: CleanRequest = serde_json::from_str("{}").unwrap();
        assert!(req.feeds.is_empty());
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_validate_blank_feed() {
        let req = CleanRequest {
            feeds: vec!["https://a/rss".to_string(), "  ".to_string()],
        };
        assert!(req.validate().is_some());
    }
}
