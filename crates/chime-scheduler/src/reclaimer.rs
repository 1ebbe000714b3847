//! Stale entry reclamation.
//!
//! An entry whose wake-up should have fired long ago but was never cleaned
//! up (the process died before the fire callback ran) would otherwise sit in
//! the durable store forever. Reclamation is lazy: the scheduler runs it at
//! the start of every `schedule` call and nowhere else.

use chime_core::error::Result;
use chime_core::types::IntentId;
use std::collections::BTreeMap;

use crate::tables::IntentTables;

#[derive(Debug, Clone, Copy)]
pub struct Reclaimer {
    retention_window_ms: i64,
}

impl Reclaimer {
    pub fn new(retention_window_ms: i64) -> Self {
        Self { retention_window_ms }
    }

    pub fn retention_window_ms(&self) -> i64 {
        self.retention_window_ms
    }

    /// Entries with `now_ms > trigger_time_ms + retention_window_ms`.
    pub fn stale_ids(&self, trigger_times: &BTreeMap<IntentId, i64>, now_ms: i64) -> Vec<IntentId> {
        trigger_times
            .iter()
            .filter(|&(_, &trigger)| now_ms > trigger.saturating_add(self.retention_window_ms))
            .map(|(&id, _)| id)
            .collect()
    }

    /// Remove every stale entry from the intent tables; returns what was removed.
    pub async fn reclaim(&self, tables: &IntentTables, now_ms: i64) -> Result<Vec<IntentId>> {
        let stale = self.stale_ids(&tables.trigger_times().await?, now_ms);
        for id in &stale {
            tables.remove(*id).await?;
        }
        if !stale.is_empty() {
            tracing::debug!("♻️ Reclaimed {} stale intent(s): {:?}", stale.len(), stale);
        }
        Ok(stale)
    }
}
