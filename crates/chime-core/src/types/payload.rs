//! Wake-up payload: the flat key/value bag handed to the wake-up service
//! and returned to the scheduler when the registration fires.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ids::{IntentId, NotificationId};
use super::notification::{Notification, Priority};
use crate::error::{ChimeError, Result};

pub const KEY_INTENT_ID: &str = "IntentID";
pub const KEY_TRIGGER_TIME: &str = "TriggerTime";
pub const KEY_BODY: &str = "NotificationBody";
pub const KEY_NOTIFICATION_ID: &str = "NotificationID";
pub const KEY_PRIORITY: &str = "Priority";
pub const KEY_REGISTRATION: &str = "RegistrationToken";

const RESERVED_KEYS: &[&str] = &[
    KEY_INTENT_ID,
    KEY_TRIGGER_TIME,
    KEY_BODY,
    KEY_NOTIFICATION_ID,
    KEY_PRIORITY,
    KEY_REGISTRATION,
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WakeupPayload {
    entries: BTreeMap<String, String>,
}

impl WakeupPayload {
    /// Build the payload for one scheduled entry. Caller params go in first,
    /// so a param named like a reserved key is overwritten.
    ///
    /// `registration` is the token stored next to the entry when it was
    /// scheduled; a fired payload only counts if the two still match.
    pub fn new(intent_id: IntentId, trigger_time_ms: i64, registration: i64, notification: &Notification) -> Self {
        let mut entries = notification.params.clone();
        entries.insert(KEY_REGISTRATION.into(), registration.to_string());
        entries.insert(KEY_TRIGGER_TIME.into(), trigger_time_ms.to_string());
        entries.insert(KEY_BODY.into(), notification.body.clone());
        entries.insert(KEY_NOTIFICATION_ID.into(), notification.notification_id.to_string());
        entries.insert(KEY_PRIORITY.into(), notification.priority.as_i32().to_string());
        entries.insert(KEY_INTENT_ID.into(), intent_id.as_key());
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn intent_id(&self) -> Result<IntentId> {
        let raw = self.required(KEY_INTENT_ID)?;
        IntentId::from_key(raw)
            .ok_or_else(|| ChimeError::payload(format!("{KEY_INTENT_ID} is not an intent id: {raw:?}")))
    }

    pub fn trigger_time_ms(&self) -> Result<i64> {
        self.parse_required(KEY_TRIGGER_TIME)
    }

    pub fn notification_id(&self) -> Result<NotificationId> {
        self.parse_required(KEY_NOTIFICATION_ID)
    }

    pub fn registration(&self) -> Result<i64> {
        self.parse_required(KEY_REGISTRATION)
    }

    /// Reassemble the notification that was scheduled.
    pub fn notification(&self) -> Result<Notification> {
        let code: i32 = self.parse_required(KEY_PRIORITY)?;
        let priority = Priority::from_i32(code)
            .ok_or_else(|| ChimeError::payload(format!("unknown priority code {code}")))?;
        let params = self
            .entries
            .iter()
            .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Notification {
            body: self.required(KEY_BODY)?.to_string(),
            notification_id: self.notification_id()?,
            priority,
            params,
        })
    }

    fn required(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| ChimeError::payload(format!("missing {key}")))
    }

    fn parse_required<T: std::str::FromStr>(&self, key: &str) -> Result<T> {
        let raw = self.required(key)?;
        raw.parse()
            .map_err(|_| ChimeError::payload(format!("{key} is not a number: {raw:?}")))
    }
}

impl FromIterator<(String, String)> for WakeupPayload {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Notification {
        Notification::new("Your crops are ready", 7)
            .with_priority(Priority::High)
            .with_param("farm", "north")
    }

    #[test]
    fn test_reserved_fields() {
        let payload = WakeupPayload::new(IntentId(3), 1_700_000_000_000, -42, &sample());
        assert_eq!(payload.intent_id().unwrap(), IntentId(3));
        assert_eq!(payload.registration().unwrap(), -42);
        assert_eq!(payload.trigger_time_ms().unwrap(), 1_700_000_000_000);
        assert_eq!(payload.notification_id().unwrap(), 7);
        assert_eq!(payload.get(KEY_PRIORITY), Some("1"));
        assert_eq!(payload.get("farm"), Some("north"));
    }

    #[test]
    fn test_notification_excludes_reserved_keys() {
        let payload = WakeupPayload::new(IntentId(0), 10, 1, &sample());
        let n = payload.notification().unwrap();
        assert_eq!(n, sample());
    }

    #[test]
    fn test_param_cannot_shadow_intent_id() {
        let n = Notification::new("x", 1)
            .with_param(KEY_INTENT_ID, "999")
            .with_param(KEY_REGISTRATION, "0");
        let payload = WakeupPayload::new(IntentId(4), 10, 77, &n);
        assert_eq!(payload.intent_id().unwrap(), IntentId(4));
        assert_eq!(payload.registration().unwrap(), 77);
    }

    #[test]
    fn test_missing_intent_id() {
        let payload: WakeupPayload = [("NotificationBody".to_string(), "x".to_string())]
            .into_iter()
            .collect();
        assert!(matches!(payload.intent_id(), Err(ChimeError::InvalidPayload(_))));
    }

    #[test]
    fn test_garbage_intent_id() {
        let payload: WakeupPayload = [(KEY_INTENT_ID.to_string(), "-2".to_string())]
            .into_iter()
            .collect();
        assert!(payload.intent_id().is_err());
    }
}
