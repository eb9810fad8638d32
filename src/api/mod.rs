//! API Module
//!
//! HTTP handlers and routing for the admin API.
//!
//! # Endpoints
//! - `GET /health`, `GET /stats`
//! - `GET /links/:fingerprint` - Links recorded for a feed
//! - `GET /jail`, `POST /jail/release` - Login jail
//! - `POST /dedupe`, `POST /clean`, `POST /reset/:key`, `POST /save` - Maintenance

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
