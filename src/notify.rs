//! Notification Module
//!
//! Fire-and-forget notices about the login gate (lock, release). Delivery
//! is an external concern; callers only see success or a `NotifyError`.

use thiserror::Error;
use tracing::{info, warn};

/// A message for the operator, optionally with an attached image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    /// Device, channel or address the message is meant for
    pub target: String,
    /// Diagnostic image (e.g. a screenshot of a failed login page)
    pub image: Option<Vec<u8>>,
}

impl Notification {
    pub fn new(message: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            target: target.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: Option<Vec<u8>>) -> Self {
        self.image = image;
        self
    }
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notification rejected: {0}")]
    Rejected(String),

    #[error("Notification transport failed: {0}")]
    Transport(String),
}

/// Delivers notifications to the operator.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Notifier that writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        if notification.message.is_empty() {
            warn!("Passed empty message to notifier.");
            return Ok(());
        }
        info!(
            target: "feedstash::notify",
            to = %notification.target,
            image_bytes = notification.image.as_ref().map_or(0, Vec::len),
            "{}",
            notification.message
        );
        Ok(())
    }
}
