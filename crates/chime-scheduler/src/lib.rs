//! # Chime Scheduler
//!
//! Deferred notifications that survive restarts.
//!
//! ## Design
//! - Three durable namespaces keyed by intent ID: trigger time, notification ID
//!   and the token of the wake-up registration that owns the entry
//! - Intent IDs are the lowest free integer, so numbering is reproducible
//! - Stale entries are reclaimed lazily, at the start of every schedule
//! - One lock per scheduler; every operation is a single critical section
//!
//! ## Architecture
//! ```text
//! NotificationScheduler
//!   ├── schedule()      → Reclaimer → allocator → IntentTables → WakeupService
//!   ├── cancel_by_id()  → IntentTables (scan values) → WakeupService::cancel
//!   ├── cancel_all()    → IntentTables (all keys)    → WakeupService::cancel
//!   └── on_wakeup_fired() ← WakeupService
//!                         → token check → IntentTables::remove → Presenter
//! ```

pub mod allocator;
pub mod engine;
pub mod notify;
pub mod reclaimer;
pub mod tables;
pub mod wakeup;

pub use engine::NotificationScheduler;
pub use notify::ChannelPresenter;
pub use reclaimer::Reclaimer;
pub use tables::IntentTables;
pub use wakeup::TokioWakeupService;
