//! Notification content and pending-entry views.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ids::{IntentId, NotificationId};

/// Delivery priority of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Standard,
    High,
}

impl Priority {
    pub fn as_i32(self) -> i32 {
        match self {
            Priority::Standard => 0,
            Priority::High => 1,
        }
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Priority::Standard),
            1 => Some(Priority::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Standard => write!(f, "standard"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// What gets shown when a scheduled entry fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub body: String,
    pub notification_id: NotificationId,
    #[serde(default)]
    pub priority: Priority,
    /// Extra caller parameters, forwarded untouched to the presenter.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

impl Notification {
    pub fn new(body: impl Into<String>, notification_id: NotificationId) -> Self {
        Self {
            body: body.into(),
            notification_id,
            priority: Priority::Standard,
            params: BTreeMap::new(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// One row of the joined intent tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEntry {
    pub intent_id: IntentId,
    pub trigger_time_ms: i64,
    pub notification_id: NotificationId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_codes() {
        assert_eq!(Priority::Standard.as_i32(), 0);
        assert_eq!(Priority::from_i32(1), Some(Priority::High));
        assert_eq!(Priority::from_i32(7), None);
    }

    #[test]
    fn test_builder() {
        let n = Notification::new("hello", 42)
            .with_priority(Priority::High)
            .with_param("screen", "inbox");
        assert_eq!(n.notification_id, 42);
        assert_eq!(n.priority, Priority::High);
        assert_eq!(n.params.get("screen").map(String::as_str), Some("inbox"));
    }

    #[test]
    fn test_json_omits_empty_params() {
        let json = serde_json::to_value(Notification::new("hi", 1)).unwrap();
        assert_eq!(json["priority"], "standard");
        assert!(json.get("params").is_none());
    }
}
