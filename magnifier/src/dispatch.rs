//! Handing work back to the UI thread.

use async_channel::{Receiver, Sender};
use std::fmt;

/// A unit of work that must run on the UI thread.
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// Schedules tasks on the UI/main thread.
///
/// Platform hosts implement this with their main queue
/// (`DispatchQueue.main`, a `Handler` on the main `Looper`, ...).
pub trait UiDispatcher: Send + Sync + fmt::Debug {
    /// Schedule `task` to run on the UI thread.
    fn dispatch(&self, task: UiTask);
}

/// Runs tasks inline on the dispatching thread.
///
/// Suitable when the host has no thread affinity, and for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateDispatcher;

impl UiDispatcher for ImmediateDispatcher {
    fn dispatch(&self, task: UiTask) {
        task();
    }
}

/// Queues tasks until the UI thread drains them.
#[derive(Clone)]
pub struct QueueDispatcher {
    sender: Sender<UiTask>,
    receiver: Receiver<UiTask>,
}

impl fmt::Debug for QueueDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueDispatcher")
            .field("pending", &self.receiver.len())
            .finish()
    }
}

impl Default for QueueDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueDispatcher {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = async_channel::unbounded();
        Self { sender, receiver }
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Run every queued task, returning how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Wait for the next task and run it.
    ///
    /// Returns `false` once the queue is closed and empty.
    pub async fn run_next(&self) -> bool {
        match self.receiver.recv().await {
            Ok(task) => {
                task();
                true
            }
            Err(_) => false,
        }
    }

    /// Remove queued tasks without running them, oldest first.
    ///
    /// Lets the caller run them in an order of its choosing.
    #[must_use]
    pub fn take_pending(&self) -> Vec<UiTask> {
        std::iter::from_fn(|| self.receiver.try_recv().ok()).collect()
    }

    /// Close the queue; tasks dispatched afterwards are dropped.
    pub fn close(&self) {
        self.sender.close();
    }
}

impl UiDispatcher for QueueDispatcher {
    fn dispatch(&self, task: UiTask) {
        if self.sender.try_send(task).is_err() {
            log::debug!("UI queue closed, dropping task");
        }
    }
}
