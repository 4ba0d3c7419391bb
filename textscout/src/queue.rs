//! Shared work queue between the producer and the worker pool.
//!
//! The queue is an unbounded FIFO of [`WorkItem`]s with an acknowledgement
//! protocol on top of it:
//!
//! ```text
//!  push ──► pending += 1 ──► channel ──► pop ──► (process) ──► mark_done ──► pending -= 1
//!                                                                               │
//!                                                  wait_for_drain ◄── notify ◄──┘ (pending == 0)
//! ```
//!
//! `pending` counts items that were pushed but not yet acknowledged, so
//! [`WorkQueue::wait_for_drain`] returns only once every item has been fully
//! processed, not merely dequeued.

use crossbeam_channel::{Receiver, Sender};
use std::path::PathBuf;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::trace;

use crate::errors::{SearchError, SearchResult};

/// A unit of work handed to a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    /// A file to scan
    Path(PathBuf),
    /// Tells the worker that pops it to stop. One is pushed per worker.
    Shutdown,
}

/// Thread-safe unbounded FIFO queue with drain tracking
#[derive(Debug)]
pub struct WorkQueue {
    sender: Sender<WorkItem>,
    receiver: Receiver<WorkItem>,
    pending: Mutex<usize>,
    drained: Condvar,
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkQueue {
    /// Creates an empty queue
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            sender,
            receiver,
            pending: Mutex::new(0),
            drained: Condvar::new(),
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, usize> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an item to the tail. Never blocks.
    pub fn push(&self, item: WorkItem) {
        *self.lock_pending() += 1;
        // The queue owns a receiver, so the channel can never be disconnected here
        let _ = self.sender.send(item);
    }

    /// Blocks until an item is available and removes it from the head.
    ///
    /// Returns `None` only if the channel has been disconnected, which cannot
    /// happen while the queue is alive.
    pub fn pop(&self) -> Option<WorkItem> {
        self.receiver.recv().ok()
    }

    /// Removes the head item if one is immediately available
    pub fn try_pop(&self) -> Option<WorkItem> {
        self.receiver.try_recv().ok()
    }

    /// Acknowledges one popped item as fully processed
    pub fn mark_done(&self) -> SearchResult<()> {
        let mut pending = self.lock_pending();
        if *pending == 0 {
            return Err(SearchError::QueueAccounting);
        }
        *pending -= 1;
        if *pending == 0 {
            trace!("Work queue drained");
            self.drained.notify_all();
        }
        Ok(())
    }

    /// Blocks until every pushed item has been acknowledged
    pub fn wait_for_drain(&self) {
        let pending = self.lock_pending();
        let _drained = self
            .drained
            .wait_while(pending, |pending| *pending > 0)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Like [`WorkQueue::wait_for_drain`], but gives up after `timeout`.
    /// Returns whether the queue is drained.
    pub fn wait_for_drain_timeout(&self, timeout: Duration) -> bool {
        let pending = self.lock_pending();
        let (pending, _) = self
            .drained
            .wait_timeout_while(pending, timeout, |pending| *pending > 0)
            .unwrap_or_else(PoisonError::into_inner);
        *pending == 0
    }

    /// Number of pushed items not yet acknowledged
    pub fn pending(&self) -> usize {
        *self.lock_pending()
    }

    /// Number of items waiting to be popped
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
