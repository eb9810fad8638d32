//! Cache Template
//!
//! The fixed set of top-level subtrees and their default values.

use chrono::NaiveDateTime;
use serde_json::{json, Map, Value};

/// Seen item identifiers per feed fingerprint.
pub const LINKS_KEY: &str = "links";
/// `[locked, timestamp]` of the login gate.
pub const JAIL_STATE_KEY: &str = "jail_state";
/// Replayable session cookies per domain.
pub const SESSION_COOKIES_KEY: &str = "session_cookies";

/// Every key the template defines, in snapshot order.
pub const TEMPLATE_KEYS: [&str; 3] = [LINKS_KEY, JAIL_STATE_KEY, SESSION_COOKIES_KEY];

/// Format used to write and parse the jail timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Returns true if `key` is one of the template's top-level keys.
pub fn is_template_key(key: &str) -> bool {
    TEMPLATE_KEYS.contains(&key)
}

/// Default value of one template key, or `None` for unknown keys.
pub fn default_for(key: &str, now: NaiveDateTime) -> Option<Value> {
    match key {
        LINKS_KEY | SESSION_COOKIES_KEY => Some(Value::Object(Map::new())),
        JAIL_STATE_KEY => Some(json!([false, now.format(TIMESTAMP_FORMAT).to_string()])),
        _ => None,
    }
}

/// A fresh cache root with every template subtree at its default.
pub fn template(now: NaiveDateTime) -> Map<String, Value> {
    TEMPLATE_KEYS
        .iter()
        .filter_map(|key| default_for(key, now).map(|v| (key.to_string(), v)))
        .collect()
}

/// Adds any template key missing from `root`, leaving present keys alone.
///
/// Returns the keys that were added.
pub fn backfill(root: &mut Map<String, Value>, now: NaiveDateTime) -> Vec<&'static str> {
    let mut added = Vec::new();
    for key in TEMPLATE_KEYS {
        if !root.contains_key(key) {
            if let Some(default) = default_for(key, now) {
                root.insert(key.to_string(), default);
                added.push(key);
            }
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_template_has_all_keys() {
        let root = template(fixed_now());
        assert_eq!(root.len(), 3);
        assert_eq!(root[LINKS_KEY], json!({}));
        assert_eq!(root[SESSION_COOKIES_KEY], json!({}));
        assert_eq!(root[JAIL_STATE_KEY], json!([false, "2024-03-01 12:00:00"]));
    }

    #[test]
    fn test_backfill_keeps_present_keys() {
        let mut root = Map::new();
        root.insert(LINKS_KEY.to_string(), json!({"fp": ["a"]}));

        let added = backfill(&mut root, fixed_now());

        assert_eq!(added, vec![JAIL_STATE_KEY, SESSION_COOKIES_KEY]);
        assert_eq!(root[LINKS_KEY], json!({"fp": ["a"]}));
        assert!(root.contains_key(SESSION_COOKIES_KEY));
    }

    #[test]
    fn test_unknown_key_has_no_default() {
        assert!(default_for("substack_jail", fixed_now()).is_none());
        assert!(!is_template_key("substack_jail"));
        assert!(is_template_key(JAIL_STATE_KEY));
    }
}
