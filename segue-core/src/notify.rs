//! Notification events for the presentation layer
//!
//! The core reports outcomes; rendering them (toasts, a status line) is a
//! collaborator concern. Delivery is best-effort: a full or disconnected
//! sink must never block the control thread.

use crossbeam_channel::{bounded, Receiver, Sender};

pub(crate) const CHANNEL_CAPACITY: usize = 256;

/// How a notification should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// A single presentation event emitted by the core
#[derive(Debug, Clone)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl Notification {
    /// Build an informational notification
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Build an error notification
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Create the bounded channel a session reports through
///
/// The capacity leaves headroom for bursts without unbounded growth; the
/// session drops notifications rather than wait on a full channel.
pub fn notification_channel() -> (Sender<Notification>, Receiver<Notification>) {
    bounded(CHANNEL_CAPACITY)
}
