//! Tokio-timer wake-up service.
//!
//! Each registration is a spawned task sleeping until its deadline. Fired
//! payloads are pushed onto an unbounded channel; the scheduler's run loop
//! drains it. Registrations live in process memory only and are lost on
//! restart, like OS alarms after a reboot.

use async_trait::async_trait;
use chime_core::clock::Clock;
use chime_core::error::{ChimeError, Result};
use chime_core::traits::WakeupService;
use chime_core::types::{WakeupHandle, WakeupPayload};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

struct Timer {
    generation: u64,
    task: AbortHandle,
}

type TimerMap = Arc<Mutex<HashMap<WakeupHandle, Timer>>>;

pub struct TokioWakeupService {
    clock: Arc<dyn Clock>,
    timers: TimerMap,
    next_generation: AtomicU64,
    fired_tx: mpsc::UnboundedSender<WakeupPayload>,
}

impl TokioWakeupService {
    /// Create the service and the receiver fired payloads arrive on.
    pub fn new(clock: Arc<dyn Clock>) -> (Self, mpsc::UnboundedReceiver<WakeupPayload>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let service = Self {
            clock,
            timers: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
            fired_tx: tx,
        };
        (service, rx)
    }

    /// Registrations that have neither fired nor been cancelled.
    pub fn pending_count(&self) -> usize {
        self.timers.lock().map(|t| t.len()).unwrap_or(0)
    }
}

#[async_trait]
impl WakeupService for TokioWakeupService {
    fn name(&self) -> &str { "tokio" }

    async fn register(&self, at_ms: i64, payload: WakeupPayload) -> Result<WakeupHandle> {
        let handle = WakeupHandle::from(payload.intent_id()?);
        let delay_ms = u64::try_from(at_ms.saturating_sub(self.clock.now_ms())).unwrap_or(0);
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        // Held across spawn so a zero-delay task cannot fire before it is recorded.
        let mut timers = self.timers.lock().map_err(|e| ChimeError::wakeup(e.to_string()))?;

        let task_timers = Arc::clone(&self.timers);
        let tx = self.fired_tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            let Ok(mut timers) = task_timers.lock() else {
                return;
            };
            // Cancelled or superseded while the lock was contended.
            if timers.get(&handle).is_none_or(|t| t.generation != generation) {
                return;
            }
            timers.remove(&handle);
            if tx.send(payload).is_err() {
                tracing::debug!("Wake-up {handle} fired with no receiver");
            }
        });

        if let Some(previous) = timers.insert(handle, Timer { generation, task: task.abort_handle() }) {
            previous.task.abort();
            tracing::debug!("Wake-up {handle} replaced");
        }
        tracing::debug!("⏰ Wake-up {handle} registered in {delay_ms}ms");
        Ok(handle)
    }

    async fn cancel(&self, handle: WakeupHandle) -> Result<()> {
        let removed = self.timers
            .lock()
            .map_err(|e| ChimeError::wakeup(e.to_string()))?
            .remove(&handle);
        if let Some(timer) = removed {
            timer.task.abort();
            tracing::debug!("Wake-up {handle} cancelled");
        }
        Ok(())
    }
}

impl Drop for TokioWakeupService {
    fn drop(&mut self) {
        if let Ok(mut timers) = self.timers.lock() {
            for (_, timer) in timers.drain() {
                timer.task.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chime_core::clock::ManualClock;
    use chime_core::types::{IntentId, Notification};

    const NOW: i64 = 1_700_000_000_000;

    fn payload(id: u32) -> WakeupPayload {
        WakeupPayload::new(IntentId(id), NOW + 1_000, 0, &Notification::new("ping", 1))
    }

    fn service() -> (TokioWakeupService, mpsc::UnboundedReceiver<WakeupPayload>) {
        TokioWakeupService::new(Arc::new(ManualClock::new(NOW)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let (svc, mut rx) = service();
        let handle = svc.register(NOW + 1_000, payload(0)).await.unwrap();
        assert_eq!(handle.intent_id(), IntentId(0));
        assert_eq!(svc.pending_count(), 1);

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert!(rx.try_recv().is_err());

        let fired = rx.recv().await.unwrap();
        assert_eq!(fired.intent_id().unwrap(), IntentId(0));
        assert_eq!(svc.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_past_deadline_fires_immediately() {
        let (svc, mut rx) = service();
        svc.register(NOW - 5_000, payload(2)).await.unwrap();
        let fired = rx.recv().await.unwrap();
        assert_eq!(fired.intent_id().unwrap(), IntentId(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent() {
        let (svc, mut rx) = service();
        let handle = svc.register(NOW + 1_000, payload(0)).await.unwrap();
        svc.cancel(handle).await.unwrap();
        svc.cancel(handle).await.unwrap();
        svc.cancel(WakeupHandle::from(IntentId(99))).await.unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(svc.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reregister_replaces() {
        let (svc, mut rx) = service();
        svc.register(NOW + 1_000, payload(0)).await.unwrap();
        let later = WakeupPayload::new(IntentId(0), NOW + 3_000, 1, &Notification::new("later", 2));
        svc.register(NOW + 3_000, later).await.unwrap();
        assert_eq!(svc.pending_count(), 1);

        let fired = rx.recv().await.unwrap();
        assert_eq!(fired.notification_id().unwrap(), 2);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_register_rejects_payload_without_intent() {
        let (svc, _rx) = service();
        let err = svc.register(NOW, WakeupPayload::default()).await.unwrap_err();
        assert!(matches!(err, ChimeError::InvalidPayload(_)));
    }
}
