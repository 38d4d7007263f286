use std::{
    sync::{Mutex, PoisonError},
    time::Duration,
};

use futures::{
    executor::block_on,
    future::{select, Either, Shared},
    FutureExt,
};
use futures_channel::oneshot;

use crate::timer::deadline;

/// Future resolving once the latch is signaled
pub type LatchWait<T> = Shared<oneshot::Receiver<T>>;

/// A value that can be set at most once and is then seen by every past and future waiter
///
/// Waiting never spins: blocking waits park the thread on an executor until the value arrives.
/// If the latch is dropped without being signaled, waiters get [oneshot::Canceled].
pub struct OneShotLatch<T: Clone> {
    sender: Mutex<Option<oneshot::Sender<T>>>,
    receiver: LatchWait<T>,
}
impl<T: Clone> Default for OneShotLatch<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> OneShotLatch<T> {
    pub fn new() -> Self {
        let (sender, receiver) = oneshot::channel();
        OneShotLatch {
            sender: Mutex::new(Some(sender)),
            receiver: receiver.shared(),
        }
    }

    /// Latches `value`
    ///
    /// Returns false if the latch was already signaled, the value is then discarded.
    pub fn signal(&self, value: T) -> bool {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match sender {
            // Err only means no receiver is left, which can't happen while we hold one
            Some(sender) => {
                let _ = sender.send(value);
                true
            }
            None => false,
        }
    }

    pub fn is_signaled(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Resolves with the latched value
    pub fn wait(&self) -> LatchWait<T> {
        self.receiver.clone()
    }

    /// Blocks the calling thread until the latch is signaled
    pub fn wait_blocking(&self) -> Result<T, oneshot::Canceled> {
        block_on(self.wait())
    }

    /// Blocks the calling thread until the latch is signaled or `timeout` elapsed
    ///
    /// Returns `Ok(None)` on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<Option<T>, oneshot::Canceled> {
        // Already latched - no need for a timer
        if let Some(result) = self.wait().now_or_never() {
            return result.map(Some);
        }

        match block_on(select(self.wait(), deadline(timeout))) {
            Either::Left((result, _)) => result.map(Some),
            Either::Right(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    #[test]
    fn waiting_after_signal_returns_immediately() {
        let latch = OneShotLatch::new();
        assert!(!latch.is_signaled());
        assert!(latch.signal(5));
        assert!(latch.is_signaled());

        assert_eq!(latch.wait_blocking(), Ok(5));
        assert_eq!(latch.wait_blocking(), Ok(5));
        assert_eq!(latch.wait_timeout(Duration::from_secs(60)), Ok(Some(5)));
    }

    #[test]
    fn second_signal_is_discarded() {
        let latch = OneShotLatch::new();
        assert!(latch.signal("first"));
        assert!(!latch.signal("second"));
        assert_eq!(latch.wait_blocking(), Ok("first"));
    }

    #[test]
    fn every_waiter_is_released() {
        let latch = Arc::new(OneShotLatch::new());
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let latch = latch.clone();
                thread::spawn(move || latch.wait_blocking())
            })
            .collect();

        latch.signal(String::from("closed"));
        for waiter in waiters {
            assert_eq!(waiter.join().unwrap(), Ok(String::from("closed")));
        }
    }

    #[test]
    fn timed_wait_gives_up() {
        let latch = OneShotLatch::<u8>::new();
        assert_eq!(latch.wait_timeout(Duration::from_millis(10)), Ok(None));
    }

    #[test]
    fn dropped_latch_cancels_waiters() {
        let latch = OneShotLatch::<u8>::new();
        let wait = latch.wait();
        drop(latch);
        assert_eq!(block_on(wait), Err(oneshot::Canceled));
    }
}
