//! Collaborator contracts the scheduler is written against.

pub mod presenter;
pub mod store;
pub mod wakeup;

pub use presenter::Presenter;
pub use store::{DurableMapStore, StoredValue};
pub use wakeup::WakeupService;
