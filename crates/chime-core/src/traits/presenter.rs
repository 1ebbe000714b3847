//! Rendering collaborator: turns a fired entry into something the user sees.

use crate::types::Notification;

/// Fire-and-forget sink for fired notifications.
pub trait Presenter: Send + Sync {
    fn present(&self, notification: &Notification);
}
