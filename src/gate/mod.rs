//! Gate Module
//!
//! Login throttle ("jail") for feeds that need an authenticated session.

mod access;
mod jail;
mod pacer;

pub use access::AccessGate;
pub use jail::{JailState, JailTransition};
pub use pacer::LoginPacer;

/// Result of one login attempt as seen by the crawler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The session reached the account state
    LoggedIn,
    /// The poll budget ran out; the gate is now locked
    Exhausted,
    /// The gate refused the attempt
    Refused,
}
