use std::{
    future::Future,
    pin::Pin,
    sync::mpsc::{self, RecvTimeoutError},
    task::{Context, Poll},
    thread::{self, JoinHandle},
    time::Duration,
};

use futures::{future::FusedFuture, FutureExt};
use futures_channel::oneshot;

/// Resolves once its timeout has elapsed
///
/// Backed by a timer thread, so it works with any executor.
/// Dropping the deadline stops the thread right away.
pub struct Deadline {
    elapsed: oneshot::Receiver<()>,
    /// Disconnects the timer thread on drop
    _cancel: mpsc::Sender<()>,
}

impl Future for Deadline {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        self.elapsed.poll_unpin(cx).map(|_| ())
    }
}

impl FusedFuture for Deadline {
    fn is_terminated(&self) -> bool {
        self.elapsed.is_terminated()
    }
}

/// Returns a future that resolves once `timeout` has elapsed
pub fn deadline(timeout: Duration) -> Deadline {
    spawn_deadline(timeout).0
}

fn spawn_deadline(timeout: Duration) -> (Deadline, JoinHandle<()>) {
    let (elapsed_tx, elapsed_rx) = oneshot::channel::<()>();
    let (cancel_tx, cancel_rx) = mpsc::channel::<()>();

    let timer = thread::spawn(move || {
        // Disconnected: the deadline was dropped before it elapsed
        if let Err(RecvTimeoutError::Timeout) = cancel_rx.recv_timeout(timeout) {
            let _ = elapsed_tx.send(());
        }
    });

    let deadline = Deadline {
        elapsed: elapsed_rx,
        _cancel: cancel_tx,
    };
    (deadline, timer)
}
