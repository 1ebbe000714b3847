//! Identifier newtypes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller-supplied identifier of a logical notification.
/// Several scheduled entries may share one.
pub type NotificationId = i32;

/// Allocator-assigned identifier of one scheduled entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntentId(pub u32);

impl IntentId {
    pub fn get(self) -> u32 {
        self.0
    }

    /// Key under which this intent is stored in a durable map namespace.
    pub fn as_key(self) -> String {
        self.0.to_string()
    }

    /// Parse a store key. Keys that are not canonical decimal integers
    /// (e.g. `"007"`, `"-1"`, `"abc"`) do not name an intent.
    pub fn from_key(key: &str) -> Option<Self> {
        let id: IntentId = key.parse().ok()?;
        (id.as_key() == key).then_some(id)
    }
}

impl fmt::Display for IntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for IntentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>().map(Self)
    }
}

/// Cancellation handle for a wake-up registration.
///
/// Derived from the intent ID, so it can be rebuilt after a restart
/// without persisting anything beyond the two intent tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WakeupHandle(IntentId);

impl WakeupHandle {
    pub fn intent_id(self) -> IntentId {
        self.0
    }
}

impl From<IntentId> for WakeupHandle {
    fn from(id: IntentId) -> Self {
        Self(id)
    }
}

impl fmt::Display for WakeupHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wakeup#{}", self.0)
    }
}
