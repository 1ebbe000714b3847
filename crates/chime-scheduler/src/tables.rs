//! Typed view over the intent namespaces of the durable map store.
//!
//! Every namespace is keyed by intent ID. Rows are always written and
//! removed together; callers hold the scheduler lock around every
//! read-modify-write that spans them.

use chime_core::error::Result;
use chime_core::traits::{DurableMapStore, StoredValue};
use chime_core::types::{IntentId, NotificationId, PendingEntry};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Intent ID -> trigger time (ms since epoch).
pub const TRIGGER_TABLE: &str = "IntentIDsToTriggerTime";
/// Intent ID -> notification ID.
pub const NOTIFICATION_TABLE: &str = "IntentIDsToNotificationIDs";
/// Intent ID -> token of the wake-up registration that belongs to it.
pub const REGISTRATION_TABLE: &str = "IntentIDsToRegistrationToken";

/// Insert order. The registration row goes last, so its presence implies
/// the other two; removal runs in reverse.
const TABLES: [&str; 3] = [TRIGGER_TABLE, NOTIFICATION_TABLE, REGISTRATION_TABLE];

#[derive(Clone)]
pub struct IntentTables {
    store: Arc<dyn DurableMapStore>,
}

impl IntentTables {
    pub fn new(store: Arc<dyn DurableMapStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DurableMapStore> {
        &self.store
    }

    pub async fn insert(
        &self,
        intent_id: IntentId,
        trigger_time_ms: i64,
        notification_id: NotificationId,
        registration: i64,
    ) -> Result<()> {
        let key = intent_id.as_key();
        self.store.set(TRIGGER_TABLE, &key, StoredValue::Long(trigger_time_ms)).await?;
        self.store.set(NOTIFICATION_TABLE, &key, StoredValue::Int(notification_id)).await?;
        self.store.set(REGISTRATION_TABLE, &key, StoredValue::Long(registration)).await?;
        Ok(())
    }

    /// Remove an intent from every namespace. Missing keys are fine.
    pub async fn remove(&self, intent_id: IntentId) -> Result<()> {
        self.remove_key(&intent_id.as_key()).await
    }

    async fn remove_key(&self, key: &str) -> Result<()> {
        for table in TABLES.iter().rev() {
            self.store.delete(table, key).await?;
        }
        Ok(())
    }

    /// Token of the registration that currently owns `intent_id`.
    pub async fn registration(&self, intent_id: IntentId) -> Result<Option<i64>> {
        Ok(self.store
            .get(REGISTRATION_TABLE, &intent_id.as_key())
            .await?
            .map(StoredValue::as_i64))
    }

    /// Every key present in any namespace, including half-written rows.
    pub async fn all_intent_ids(&self) -> Result<BTreeSet<IntentId>> {
        let mut ids = BTreeSet::new();
        for table in TABLES {
            let raw = self.store.list_all(table).await?;
            ids.extend(typed_keys(table, raw).map(|(id, _)| id));
        }
        Ok(ids)
    }

    /// Intent IDs currently present in the trigger-time namespace.
    pub async fn intent_ids(&self) -> Result<BTreeSet<IntentId>> {
        Ok(self.trigger_times().await?.into_keys().collect())
    }

    pub async fn trigger_times(&self) -> Result<BTreeMap<IntentId, i64>> {
        let raw = self.store.list_all(TRIGGER_TABLE).await?;
        Ok(typed_keys(TRIGGER_TABLE, raw)
            .map(|(id, value)| (id, value.as_i64()))
            .collect())
    }

    pub async fn notification_ids(&self) -> Result<BTreeMap<IntentId, NotificationId>> {
        let raw = self.store.list_all(NOTIFICATION_TABLE).await?;
        Ok(typed_keys(NOTIFICATION_TABLE, raw)
            .filter_map(|(id, value)| match value.as_i32() {
                Some(n) => Some((id, n)),
                None => {
                    tracing::warn!("Notification id for intent {id} does not fit in i32, ignoring");
                    None
                }
            })
            .collect())
    }

    /// Joined view, sorted by intent ID. Half-written rows are skipped.
    pub async fn entries(&self) -> Result<Vec<PendingEntry>> {
        let triggers = self.trigger_times().await?;
        let notifications = self.notification_ids().await?;
        Ok(triggers
            .into_iter()
            .filter_map(|(intent_id, trigger_time_ms)| {
                notifications.get(&intent_id).map(|&notification_id| PendingEntry {
                    intent_id,
                    trigger_time_ms,
                    notification_id,
                })
            })
            .collect())
    }

    /// Drop keys missing from at least one namespace. Returns how many were dropped.
    pub async fn remove_orphans(&self) -> Result<usize> {
        let mut seen: BTreeMap<String, usize> = BTreeMap::new();
        for table in TABLES {
            for key in self.store.list_all(table).await?.into_keys() {
                *seen.entry(key).or_default() += 1;
            }
        }

        let orphans: Vec<String> = seen
            .into_iter()
            .filter(|&(_, count)| count < TABLES.len())
            .map(|(key, _)| key)
            .collect();
        for key in &orphans {
            tracing::warn!("Dropping half-written intent row {key}");
            self.remove_key(key).await?;
        }
        Ok(orphans.len())
    }
}

fn typed_keys(
    namespace: &'static str,
    raw: BTreeMap<String, StoredValue>,
) -> impl Iterator<Item = (IntentId, StoredValue)> {
    raw.into_iter().filter_map(move |(key, value)| match IntentId::from_key(&key) {
        Some(id) => Some((id, value)),
        None => {
            tracing::warn!("Ignoring foreign key {key:?} in {namespace}");
            None
        }
    })
}
