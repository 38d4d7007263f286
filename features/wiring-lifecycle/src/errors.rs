use thiserror::Error;
use wiring_di::InitError;

#[derive(Error, Debug, Clone)]
pub enum LifecycleError {
    /// Close or wait was requested before the registry was started
    #[error("The registry has not been started")]
    NotStarted,
    #[error("The registry has already been started")]
    AlreadyStarted,
    /// Wiring the registry failed
    #[error(transparent)]
    Init(#[from] InitError),
    /// The controller went away without ever signaling shutdown
    #[error("The shutdown signal was dropped before it was sent")]
    SignalDropped,
}
