//! Crawler Module
//!
//! Drives feeds through the cache and the access gate.

mod collaborators;
mod driver;
pub mod maintenance;
mod report;

pub use collaborators::{
    Article, FeedEntry, FeedFetch, FeedSource, ForwardError, Forwarder, SessionError,
    SessionProvider,
};
pub use driver::{is_discussion, Crawler};
pub use maintenance::MaintenanceReport;
pub use report::CrawlReport;
