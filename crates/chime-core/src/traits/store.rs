//! Durable map store: namespaced string keys to int/long values.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::error::Result;

/// A value held by a durable map store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredValue {
    Int(i32),
    Long(i64),
}

impl StoredValue {
    /// Widen to `i64` regardless of the stored width.
    pub fn as_i64(self) -> i64 {
        match self {
            StoredValue::Int(v) => i64::from(v),
            StoredValue::Long(v) => v,
        }
    }

    /// Narrow to `i32`; `None` if a long does not fit.
    pub fn as_i32(self) -> Option<i32> {
        match self {
            StoredValue::Int(v) => Some(v),
            StoredValue::Long(v) => i32::try_from(v).ok(),
        }
    }
}

/// Process-durable key/value maps partitioned into namespaces.
///
/// Missing keys are not errors: `get` returns `None` and `delete` is a no-op.
/// Errors mean the backend itself is unavailable.
#[async_trait]
pub trait DurableMapStore: Send + Sync {
    fn name(&self) -> &str;

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<StoredValue>>;

    async fn set(&self, namespace: &str, key: &str, value: StoredValue) -> Result<()>;

    async fn delete(&self, namespace: &str, key: &str) -> Result<()>;

    async fn list_all(&self, namespace: &str) -> Result<BTreeMap<String, StoredValue>>;

    async fn exists(&self, namespace: &str, key: &str) -> Result<bool> {
        Ok(self.get(namespace, key).await?.is_some())
    }
}
