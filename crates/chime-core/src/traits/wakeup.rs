//! Wake-up service, one-shot timed callbacks.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{WakeupHandle, WakeupPayload};

/// Schedules a payload to be delivered back to the application at an
/// absolute wall-clock time. How the payload is delivered is up to the
/// implementation (the tokio service hands out an mpsc receiver).
#[async_trait]
pub trait WakeupService: Send + Sync {
    fn name(&self) -> &str;

    /// Register a wake-up. Registering again for the same intent replaces
    /// the earlier registration.
    async fn register(&self, at_ms: i64, payload: WakeupPayload) -> Result<WakeupHandle>;

    /// Cancel a registration. Unknown, fired and already-cancelled handles are no-ops.
    async fn cancel(&self, handle: WakeupHandle) -> Result<()>;
}
