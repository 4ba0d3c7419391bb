//! Search worker threads.
//!
//! Each worker:
//! - Pops work items from the shared [`WorkQueue`]
//! - Scans the file behind each path with its [`FileProcessor`]
//! - Appends a matches or error outcome to the shared [`ResultStore`]
//! - Acknowledges every item it popped, shutdown markers included
//! - Stops after consuming exactly one shutdown marker
//!
//! ```text
//! Idle ──► Dequeuing ──► Scanning ──► Recording ──► Idle
//!              │
//!              └── shutdown marker ──► Stopped
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, trace, warn};

use super::processor::FileProcessor;
use crate::errors::{SearchError, SearchResult};
use crate::metrics::SearchMetrics;
use crate::queue::{WorkItem, WorkQueue};
use crate::results::ResultStore;

/// Lifecycle state of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    Idle = 0,
    Dequeuing = 1,
    Scanning = 2,
    Recording = 3,
    Stopped = 4,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Dequeuing,
            2 => Self::Scanning,
            3 => Self::Recording,
            _ => Self::Stopped,
        }
    }
}

/// Everything a worker shares with the rest of the run
#[derive(Debug, Clone)]
pub struct WorkerContext {
    pub queue: Arc<WorkQueue>,
    pub store: Arc<ResultStore>,
    pub processor: FileProcessor,
}

impl WorkerContext {
    pub fn new(
        queue: Arc<WorkQueue>,
        store: Arc<ResultStore>,
        search_text: &str,
        metrics: SearchMetrics,
    ) -> Self {
        Self {
            queue,
            store,
            processor: FileProcessor::new(search_text, metrics),
        }
    }
}

/// A running worker thread
#[derive(Debug)]
pub struct Worker {
    name: String,
    state: Arc<AtomicU8>,
    handle: JoinHandle<usize>,
}

impl Worker {
    /// Spawns worker `id` (1-based) on a thread named `worker-{id}`
    pub fn spawn(id: usize, context: WorkerContext) -> SearchResult<Self> {
        Self::spawn_with(id, move |state| worker_loop(&context, state))
    }

    /// Spawns worker `id` running `body` on its thread
    pub(crate) fn spawn_with<F>(id: usize, body: F) -> SearchResult<Self>
    where
        F: FnOnce(&AtomicU8) -> usize + Send + 'static,
    {
        let name = format!("worker-{}", id);
        let state = Arc::new(AtomicU8::new(WorkerState::Idle as u8));
        let thread_state = Arc::clone(&state);

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || body(&thread_state))
            .map_err(|e| SearchError::worker_spawn(name.clone(), e))?;

        Ok(Self {
            name,
            state,
            handle,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Whether the thread has exited, normally or by panicking
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the thread to exit and returns how many files it processed
    pub fn join(self) -> SearchResult<usize> {
        self.handle.join().map_err(|_| {
            error!("{} panicked", self.name);
            SearchError::thread_panicked(self.name)
        })
    }
}

fn set_state(state: &AtomicU8, next: WorkerState) {
    trace!("{} -> {:?}", current_name(), next);
    state.store(next as u8, Ordering::Release);
}

fn current_name() -> String {
    thread::current().name().unwrap_or("worker").to_string()
}

/// Acknowledges one popped item when dropped, unwinding included
struct Acknowledgement<'a> {
    queue: &'a WorkQueue,
}

impl Drop for Acknowledgement<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.queue.mark_done() {
            error!("{}: {}", current_name(), e);
        }
    }
}

fn worker_loop(context: &WorkerContext, state: &AtomicU8) -> usize {
    debug!("{} starting", current_name());
    let mut processed = 0;

    loop {
        set_state(state, WorkerState::Dequeuing);
        let item = match context.queue.pop() {
            Some(item) => item,
            None => {
                warn!("{}: work queue disconnected", current_name());
                break;
            }
        };

        let ack = Acknowledgement {
            queue: &context.queue,
        };

        match item {
            WorkItem::Shutdown => {
                context.processor.metrics().record_marker();
                set_state(state, WorkerState::Stopped);
                drop(ack);
                debug!(
                    "{} received shutdown marker after {} files",
                    current_name(),
                    processed
                );
                return processed;
            }
            WorkItem::Path(path) => {
                process_one(context, state, path);
                drop(ack);
                processed += 1;
                set_state(state, WorkerState::Idle);
            }
        }
    }

    set_state(state, WorkerState::Stopped);
    processed
}

fn process_one(context: &WorkerContext, state: &AtomicU8, path: PathBuf) {
    set_state(state, WorkerState::Scanning);
    debug!("{} processing {}", current_name(), path.display());

    if let Some(outcome) = context.processor.process_path(&path) {
        set_state(state, WorkerState::Recording);
        context.store.append(outcome);
    }
}
