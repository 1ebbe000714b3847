//! Notification scheduler. The only code that touches the intent tables.
//!
//! Every public operation takes `op_lock` for its whole duration, so the
//! fire callback, schedules and cancellations never observe a half-updated
//! set of tables or race for the same intent ID.

use chime_core::clock::{Clock, SystemClock};
use chime_core::config::SchedulerConfig;
use chime_core::error::Result;
use chime_core::traits::{DurableMapStore, Presenter, WakeupService};
use chime_core::types::{IntentId, Notification, NotificationId, PendingEntry, WakeupHandle, WakeupPayload};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

use crate::allocator;
use crate::reclaimer::Reclaimer;
use crate::tables::IntentTables;

pub struct NotificationScheduler {
    tables: IntentTables,
    wakeup: Arc<dyn WakeupService>,
    presenter: Arc<dyn Presenter>,
    clock: Arc<dyn Clock>,
    reclaimer: Reclaimer,
    op_lock: Mutex<()>,
}

impl NotificationScheduler {
    pub fn new(
        store: Arc<dyn DurableMapStore>,
        wakeup: Arc<dyn WakeupService>,
        presenter: Arc<dyn Presenter>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            tables: IntentTables::new(store),
            wakeup,
            presenter,
            clock: Arc::new(SystemClock),
            reclaimer: Reclaimer::new(config.retention_window_ms),
            op_lock: Mutex::new(()),
        }
    }

    /// Replace the wall clock used for reclamation.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn retention_window_ms(&self) -> i64 {
        self.reclaimer.retention_window_ms()
    }

    /// Schedule `notification` to fire at `trigger_time_ms`.
    ///
    /// Stale entries are reclaimed first, then the lowest free intent ID is
    /// claimed and recorded in the tables before the wake-up is registered.
    /// If registration fails the rows are removed again and the error returned.
    ///
    /// Each call stores a fresh random registration token with the entry and
    /// in the payload, so a payload from an earlier schedule of the same
    /// intent ID never matches, even across processes sharing the store.
    pub async fn schedule(&self, trigger_time_ms: i64, notification: Notification) -> Result<IntentId> {
        let _guard = self.op_lock.lock().await;

        let now_ms = self.clock.now_ms();
        self.reclaimer.reclaim(&self.tables, now_ms).await?;
        if trigger_time_ms < now_ms {
            tracing::debug!("Trigger time {trigger_time_ms} is {}ms in the past", now_ms - trigger_time_ms);
        }

        let intent_id = allocator::allocate(&self.tables.intent_ids().await?);
        let registration: i64 = rand::random();
        if let Err(e) = self.tables
            .insert(intent_id, trigger_time_ms, notification.notification_id, registration)
            .await
        {
            self.rollback(intent_id).await;
            return Err(e);
        }

        let payload = WakeupPayload::new(intent_id, trigger_time_ms, registration, &notification);
        if let Err(e) = self.wakeup.register(trigger_time_ms, payload).await {
            tracing::warn!("⚠️ Wake-up registration for intent {intent_id} failed: {e}");
            self.rollback(intent_id).await;
            return Err(e);
        }

        tracing::info!(
            "📅 Scheduled notification {} as intent {intent_id} at {trigger_time_ms}",
            notification.notification_id
        );
        Ok(intent_id)
    }

    /// Cancel every pending entry carrying `notification_id`.
    /// Returns how many were removed; zero is not an error.
    pub async fn cancel_by_id(&self, notification_id: NotificationId) -> Result<usize> {
        let _guard = self.op_lock.lock().await;

        let matches: Vec<IntentId> = self.tables
            .notification_ids()
            .await?
            .into_iter()
            .filter(|&(_, n)| n == notification_id)
            .map(|(id, _)| id)
            .collect();

        for &intent_id in &matches {
            self.cancel_intent(intent_id).await?;
        }
        tracing::info!("🗑️ Cancelled {} entr(ies) for notification {notification_id}", matches.len());
        Ok(matches.len())
    }

    /// Cancel everything. Also empties the tables after a restart, when
    /// no live wake-up registrations are left to cancel.
    pub async fn cancel_all(&self) -> Result<usize> {
        let _guard = self.op_lock.lock().await;

        let ids: BTreeSet<IntentId> = self.tables.all_intent_ids().await?;
        for &intent_id in &ids {
            self.cancel_intent(intent_id).await?;
        }
        tracing::info!("🗑️ Cancelled all {} pending entr(ies)", ids.len());
        Ok(ids.len())
    }

    /// Callback for a fired wake-up: retire the entry and present it.
    ///
    /// A payload whose entry is gone (cancelled or reclaimed before this ran)
    /// or whose intent ID now belongs to a newer schedule is dropped. The
    /// registration token decides; trigger time and notification ID may
    /// legitimately repeat between schedules.
    pub async fn on_wakeup_fired(&self, payload: &WakeupPayload) -> Result<()> {
        let intent_id = payload.intent_id()?;
        let registration = payload.registration()?;
        let notification = payload.notification()?;

        let _guard = self.op_lock.lock().await;

        match self.tables.registration(intent_id).await? {
            Some(current) if current == registration => {}
            Some(_) => {
                tracing::debug!("Intent {intent_id} was re-allocated since this wake-up was registered, dropping");
                return Ok(());
            }
            None => {
                tracing::debug!("Wake-up for intent {intent_id} is no longer pending, dropping");
                return Ok(());
            }
        }

        self.tables.remove(intent_id).await?;
        self.presenter.present(&notification);
        tracing::debug!("🔔 Intent {intent_id} fired");
        Ok(())
    }

    /// Feed fired payloads into `on_wakeup_fired` until the channel closes.
    pub async fn run(&self, mut fired: mpsc::UnboundedReceiver<WakeupPayload>) {
        while let Some(payload) = fired.recv().await {
            if let Err(e) = self.on_wakeup_fired(&payload).await {
                tracing::warn!("⚠️ Failed to handle fired wake-up: {e}");
            }
        }
        tracing::debug!("Wake-up channel closed, scheduler loop exiting");
    }

    /// Snapshot of pending entries, ordered by intent ID.
    pub async fn pending(&self) -> Result<Vec<PendingEntry>> {
        let _guard = self.op_lock.lock().await;
        self.tables.entries().await
    }

    /// Remove rows left in only one table by a crash mid-update.
    pub async fn recover(&self) -> Result<usize> {
        let _guard = self.op_lock.lock().await;
        let dropped = self.tables.remove_orphans().await?;
        if dropped > 0 {
            tracing::info!("🩹 Repaired {dropped} half-written intent row(s)");
        }
        Ok(dropped)
    }

    async fn cancel_intent(&self, intent_id: IntentId) -> Result<()> {
        self.wakeup.cancel(WakeupHandle::from(intent_id)).await?;
        self.tables.remove(intent_id).await
    }

    async fn rollback(&self, intent_id: IntentId) {
        if let Err(e) = self.tables.remove(intent_id).await {
            tracing::warn!("⚠️ Could not roll back intent {intent_id}: {e}");
        }
    }
}
