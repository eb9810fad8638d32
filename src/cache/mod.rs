//! Cache Module
//!
//! Path-addressed persistent cache of seen links, login jail state and
//! session cookies.

mod path;
mod snapshot;
mod stats;
mod store;
pub mod template;
pub mod tree;


// Re-export public types
pub use path::CachePath;
pub use snapshot::{Snapshot, SnapshotRead};
pub use stats::CacheStats;
pub use store::PathCache;
pub use template::{JAIL_STATE_KEY, LINKS_KEY, SESSION_COOKIES_KEY, TEMPLATE_KEYS};
