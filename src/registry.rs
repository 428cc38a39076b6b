//! One-shot wake registries for suspended callers.
//!
//! Both registries are plain data mutated only while the board lock is
//! held. Waking a caller is sending `()` on a oneshot channel; a send to
//! a receiver that was dropped (the caller cancelled or timed out on its
//! own) is ignored, so abandoned waits never wedge a queue.

use std::collections::HashMap;
use tokio::sync::oneshot;

/// Sender half of a suspension token.
pub(crate) type WakeSender = oneshot::Sender<()>;

/// Receiver half of a suspension token. Awaited only after the board
/// lock has been released.
pub(crate) type WakeReceiver = oneshot::Receiver<()>;

/// Per-position queues of callers waiting for a cell to stop being
/// controlled.
#[derive(Debug, Default)]
pub(crate) struct SpotWaiters {
    queues: HashMap<(usize, usize), Vec<WakeSender>>,
}

impl SpotWaiters {
    /// Registers a waiter for the exact position `(row, col)`.
    ///
    /// The resumed caller must not assume anything about board state; it
    /// has to re-validate from scratch.
    pub fn register(&mut self, row: usize, col: usize) -> WakeReceiver {
        let (tx, rx) = oneshot::channel();
        self.queues.entry((row, col)).or_default().push(tx);
        rx
    }

    /// Wakes every waiter registered for `(row, col)` and clears that
    /// position's queue. Waiters for other positions are untouched.
    pub fn notify(&mut self, row: usize, col: usize) {
        if let Some(queue) = self.queues.remove(&(row, col)) {
            for waiter in queue {
                let _ = waiter.send(());
            }
        }
    }
}

/// The set of pending one-shot change subscriptions.
#[derive(Debug, Default)]
pub(crate) struct ChangeWatchers {
    subscribers: Vec<WakeSender>,
}

impl ChangeWatchers {
    /// Registers a one-shot subscription to the next observable change.
    pub fn subscribe(&mut self) -> WakeReceiver {
        let (tx, rx) = oneshot::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Wakes every current subscriber and clears the registry.
    pub fn notify_all(&mut self) {
        for subscriber in self.subscribers.drain(..) {
            let _ = subscriber.send(());
        }
    }
}
