//! Request and Response models for the admin API
//!
//! DTOs used for serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::CleanRequest;
pub use responses::{
    CleanResponse, DedupeResponse, ErrorResponse, HealthResponse, JailResponse, LinksResponse,
    MessageResponse, StatsResponse,
};
