//! # Chime Core
//!
//! Shared vocabulary for the Chime workspace: error type, configuration,
//! identifier and payload types, the wall clock, and the collaborator traits
//! (durable map store, wake-up service, presenter) the scheduler is built on.

pub mod clock;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ChimeConfig;
pub use error::{ChimeError, Result};
