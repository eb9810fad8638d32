//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Snapshot flush: Writes the cache to disk at configured intervals

mod flush;

pub use flush::spawn_flush_task;
