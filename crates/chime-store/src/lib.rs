//! # Chime Store
//! Durable map store backends: SQLite for real use, an in-process map for tests.

pub mod memory;
pub mod sqlite;

use chime_core::config::StoreConfig;
use chime_core::error::{ChimeError, Result};
use chime_core::traits::DurableMapStore;
use std::sync::Arc;

pub use memory::MemoryMapStore;
pub use sqlite::SqliteMapStore;

/// Create a map store from configuration.
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn DurableMapStore>> {
    match config.backend.as_str() {
        "sqlite" => Ok(Arc::new(SqliteMapStore::open(&config.resolved_path())?)),
        "memory" => {
            tracing::warn!("⚠️ Using the in-memory store: scheduled entries will not survive a restart");
            Ok(Arc::new(MemoryMapStore::new()))
        }
        other => Err(ChimeError::Config(format!("Unknown store backend: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_store_backends() {
        let dir = tempfile::tempdir().unwrap();
        let sqlite = StoreConfig {
            backend: "sqlite".into(),
            path: dir.path().join("x.db").display().to_string(),
        };
        assert_eq!(create_store(&sqlite).unwrap().name(), "sqlite");

        let memory = StoreConfig { backend: "memory".into(), path: String::new() };
        assert_eq!(create_store(&memory).unwrap().name(), "memory");

        let bogus = StoreConfig { backend: "redis".into(), path: String::new() };
        assert!(matches!(create_store(&bogus), Err(ChimeError::Config(_))));
    }
}
