//! Jail State
//!
//! The persisted `[locked, timestamp]` pair and the pure transition rule
//! deciding whether a lock still holds.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::cache::template::TIMESTAMP_FORMAT;

/// Whether login attempts are suspended, and since when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JailState {
    pub locked: bool,
    pub since: NaiveDateTime,
}

/// Result of evaluating a jail state at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JailTransition {
    /// Not locked; nothing to do
    Open,
    /// Was locked, the lock is lifted now
    Released,
    /// Locked and still within the cooldown
    StillLocked,
}

impl JailState {
    pub fn unlocked(now: NaiveDateTime) -> Self {
        Self {
            locked: false,
            since: now,
        }
    }

    pub fn locked(now: NaiveDateTime) -> Self {
        Self {
            locked: true,
            since: now,
        }
    }

    /// Reads a jail state from its cached form.
    ///
    /// A missing or malformed entry counts as unlocked. A locked entry whose
    /// timestamp does not parse restarts the cooldown at `now`.
    pub fn from_value(value: Option<&Value>, now: NaiveDateTime) -> Self {
        let (locked, stamp) = match value.and_then(Value::as_array).map(Vec::as_slice) {
            Some([Value::Bool(locked), Value::String(stamp), ..]) => (*locked, stamp.as_str()),
            _ => return Self::unlocked(now),
        };

        match NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT) {
            Ok(since) => Self { locked, since },
            Err(err) => {
                warn!("Unreadable jail timestamp {:?} ({}), using now", stamp, err);
                Self { locked, since: now }
            }
        }
    }

    /// The cached form, `[locked, "YYYY-MM-DD HH:MM:SS"]`.
    pub fn to_value(&self) -> Value {
        json!([self.locked, self.since.format(TIMESTAMP_FORMAT).to_string()])
    }

    /// Decides what happens to this state at `now`.
    ///
    /// A lock lifts once `cooldown` has fully elapsed or when `release` is set.
    pub fn evaluate(&self, now: NaiveDateTime, release: bool, cooldown: Duration) -> JailTransition {
        if !self.locked {
            JailTransition::Open
        } else if release || now - self.since >= cooldown {
            JailTransition::Released
        } else {
            JailTransition::StillLocked
        }
    }
}
