//! Shared value types: identifiers, notifications, wake-up payloads.

pub mod ids;
pub mod notification;
pub mod payload;

pub use ids::{IntentId, NotificationId, WakeupHandle};
pub use notification::{Notification, PendingEntry, Priority};
pub use payload::WakeupPayload;
