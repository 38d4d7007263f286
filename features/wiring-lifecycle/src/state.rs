use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of a controlled registry
///
/// Only moves forward: `NotStarted -> Active -> Closing -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LifecycleState {
    NotStarted = 0,
    Active = 1,
    /// Teardown is running
    Closing = 2,
    /// Teardown and close hooks have finished
    Closed = 3,
}
impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LifecycleState::NotStarted,
            1 => LifecycleState::Active,
            2 => LifecycleState::Closing,
            _ => LifecycleState::Closed,
        }
    }
}
impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LifecycleState::NotStarted => "not started",
            LifecycleState::Active => "active",
            LifecycleState::Closing => "closing",
            LifecycleState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Atomic holder of a [LifecycleState]
pub(crate) struct StateCell(AtomicU8);
impl StateCell {
    pub fn new() -> Self {
        StateCell(AtomicU8::new(LifecycleState::NotStarted as u8))
    }

    pub fn get(&self) -> LifecycleState {
        LifecycleState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves from `from` to `to` if the cell currently holds `from`
    ///
    /// Exactly one of several concurrent callers with the same `from` succeeds.
    /// On failure the current state is returned.
    pub fn transition(
        &self,
        from: LifecycleState,
        to: LifecycleState,
    ) -> Result<(), LifecycleState> {
        debug_assert!(from < to, "lifecycle only moves forward");
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(LifecycleState::from_u8)
    }
}
