use crossbeam::queue::SegQueue;
use std::sync::Arc;

use crate::session::Snapshot;

/// Lock-free queue carrying one [`Snapshot`] per scheduled boundary from
/// the scheduler thread to the UI thread.
pub struct SnapshotQueue {
    queue: Arc<SegQueue<Snapshot>>,
}

impl SnapshotQueue {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(SegQueue::new()),
        }
    }

    /// Handle for the scheduler thread.
    pub fn sender(&self) -> SnapshotSender {
        SnapshotSender {
            queue: Arc::clone(&self.queue),
        }
    }

    /// Handle for the UI thread.
    pub fn receiver(&self) -> SnapshotReceiver {
        SnapshotReceiver {
            queue: Arc::clone(&self.queue),
        }
    }
}

impl Default for SnapshotQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct SnapshotSender {
    queue: Arc<SegQueue<Snapshot>>,
}

impl SnapshotSender {
    /// Push a snapshot to the UI thread (non-blocking).
    pub fn send(&self, snapshot: Snapshot) {
        self.queue.push(snapshot);
    }
}

#[derive(Clone)]
pub struct SnapshotReceiver {
    queue: Arc<SegQueue<Snapshot>>,
}

impl SnapshotReceiver {
    /// Process all pending snapshots, typically once per UI frame.
    pub fn drain<F>(&self, mut handle: F)
    where
        F: FnMut(Snapshot),
    {
        while let Some(snapshot) = self.queue.pop() {
            handle(snapshot);
        }
    }

    /// Pop the oldest pending snapshot, if any.
    pub fn try_recv(&self) -> Option<Snapshot> {
        self.queue.pop()
    }
}
