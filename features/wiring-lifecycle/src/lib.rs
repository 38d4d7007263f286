//! Lifecycle of a wired registry.
//!
//! A [LifecycleController] starts a registry, hands out a blocking (or async) wait for its
//! shutdown, and closes it exactly once no matter how many triggers race for it.
//! The outcome of the close is latched in a [ShutdownSignal] so waiters arriving late
//! are released immediately.

pub mod controller;
pub mod errors;
#[cfg(feature = "tokio")]
pub mod signals;
pub mod state;

pub use controller::{CloseHook, CloseReport, ClosingHook, LifecycleController, ShutdownSignal};
pub use errors::LifecycleError;
pub use state::LifecycleState;
pub use wiring_di::OneShotLatch;
