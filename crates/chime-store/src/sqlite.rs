//! SQLite durable map store.

use async_trait::async_trait;
use chime_core::error::{ChimeError, Result};
use chime_core::traits::{DurableMapStore, StoredValue};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

const KIND_INT: &str = "int";
const KIND_LONG: &str = "long";

pub struct SqliteMapStore {
    conn: Mutex<Connection>,
}

impl SqliteMapStore {
    /// Open or create the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| ChimeError::Store(e.to_string()))?;
        let store = Self::init(conn)?;
        tracing::debug!("🗄️ Map store opened: {}", path.display());
        Ok(store)
    }

    /// Non-durable SQLite connection, used by tests that exercise the SQL paths.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ChimeError::Store(e.to_string()))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS map_entries (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                kind TEXT NOT NULL CHECK (kind IN ('int', 'long')),
                value INTEGER NOT NULL,
                PRIMARY KEY (namespace, key)
            );"
        ).map_err(|e| ChimeError::Store(e.to_string()))?;

        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| ChimeError::Store(e.to_string()))
    }
}

fn decode(kind: &str, value: i64) -> rusqlite::Result<StoredValue> {
    match kind {
        KIND_INT => i32::try_from(value)
            .map(StoredValue::Int)
            .map_err(|_| rusqlite::Error::IntegralValueOutOfRange(3, value)),
        KIND_LONG => Ok(StoredValue::Long(value)),
        other => Err(rusqlite::Error::InvalidColumnType(
            2,
            format!("unknown kind {other}"),
            rusqlite::types::Type::Text,
        )),
    }
}

fn encode(value: StoredValue) -> (&'static str, i64) {
    match value {
        StoredValue::Int(v) => (KIND_INT, i64::from(v)),
        StoredValue::Long(v) => (KIND_LONG, v),
    }
}

#[async_trait]
impl DurableMapStore for SqliteMapStore {
    fn name(&self) -> &str { "sqlite" }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<StoredValue>> {
        let conn = self.lock()?;
        let row = conn.query_row(
            "SELECT kind, value FROM map_entries WHERE namespace = ?1 AND key = ?2",
            params![namespace, key],
            |row| {
                let kind: String = row.get(0)?;
                decode(&kind, row.get(1)?)
            },
        ).optional().map_err(|e| ChimeError::Store(e.to_string()))?;
        Ok(row)
    }

    async fn set(&self, namespace: &str, key: &str, value: StoredValue) -> Result<()> {
        let (kind, raw) = encode(value);
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO map_entries (namespace, key, kind, value) VALUES (?1, ?2, ?3, ?4)",
            params![namespace, key, kind, raw],
        ).map_err(|e| ChimeError::Store(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM map_entries WHERE namespace = ?1 AND key = ?2",
            params![namespace, key],
        ).map_err(|e| ChimeError::Store(e.to_string()))?;
        Ok(())
    }

    async fn list_all(&self, namespace: &str) -> Result<BTreeMap<String, StoredValue>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT key, kind, value FROM map_entries WHERE namespace = ?1"
        ).map_err(|e| ChimeError::Store(e.to_string()))?;

        let rows = stmt.query_map(params![namespace], |row| {
            let key: String = row.get(0)?;
            let kind: String = row.get(1)?;
            Ok((key, decode(&kind, row.get(2)?)?))
        }).map_err(|e| ChimeError::Store(e.to_string()))?;

        rows.collect::<rusqlite::Result<BTreeMap<_, _>>>()
            .map_err(|e| ChimeError::Store(e.to_string()))
    }

    async fn exists(&self, namespace: &str, key: &str) -> Result<bool> {
        let conn = self.lock()?;
        let found: i64 = conn.query_row(
            "SELECT COUNT(*) FROM map_entries WHERE namespace = ?1 AND key = ?2",
            params![namespace, key],
            |row| row.get(0),
        ).map_err(|e| ChimeError::Store(e.to_string()))?;
        Ok(found > 0)
    }
}
