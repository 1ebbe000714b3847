//! In-process map store. Not durable; state lives as long as the value.

use async_trait::async_trait;
use chime_core::error::{ChimeError, Result};
use chime_core::traits::{DurableMapStore, StoredValue};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryMapStore {
    namespaces: Mutex<HashMap<String, BTreeMap<String, StoredValue>>>,
}

impl MemoryMapStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, BTreeMap<String, StoredValue>>>> {
        self.namespaces.lock().map_err(|e| ChimeError::Store(e.to_string()))
    }
}

#[async_trait]
impl DurableMapStore for MemoryMapStore {
    fn name(&self) -> &str { "memory" }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<StoredValue>> {
        Ok(self.lock()?.get(namespace).and_then(|m| m.get(key)).copied())
    }

    async fn set(&self, namespace: &str, key: &str, value: StoredValue) -> Result<()> {
        self.lock()?
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<()> {
        if let Some(map) = self.lock()?.get_mut(namespace) {
            map.remove(key);
        }
        Ok(())
    }

    async fn list_all(&self, namespace: &str) -> Result<BTreeMap<String, StoredValue>> {
        Ok(self.lock()?.get(namespace).cloned().unwrap_or_default())
    }
}
