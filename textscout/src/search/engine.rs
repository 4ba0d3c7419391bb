use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::enumerator::enumerate_files;
use super::worker::{Worker, WorkerContext};
use crate::config::SearchConfig;
use crate::errors::{SearchError, SearchResult};
use crate::metrics::{SearchMetrics, SearchStats};
use crate::queue::{WorkItem, WorkQueue};
use crate::report::Reporter;
use crate::results::{Outcome, ResultStore, Summary};

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Everything a finished run produced
#[derive(Debug, Clone, Default)]
pub struct SearchOutput {
    /// Per-file outcomes, in the order workers recorded them
    pub outcomes: Vec<Outcome>,
    /// Producer and worker counters
    pub stats: SearchStats,
}

impl SearchOutput {
    pub fn summary(&self) -> Summary {
        Summary::from_outcomes(&self.outcomes)
    }
}

/// Runs a search and hands the results to `reporter`.
///
/// Blocks until the whole pipeline has finished. An empty search text is
/// logged and nothing is started; `Ok(None)` is returned and the reporter is
/// not called.
pub fn run_search(
    config: &SearchConfig,
    reporter: &mut dyn Reporter,
) -> SearchResult<Option<Summary>> {
    match search(config) {
        Ok(output) => {
            let summary = reporter.report(&config.search_text, &output.outcomes)?;
            Ok(Some(summary))
        }
        Err(SearchError::EmptySearchText) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Performs a concurrent search across files in a directory.
///
/// One producer thread walks the tree while `num_workers` worker threads scan
/// files. Once the producer is done, one shutdown marker per worker is queued
/// behind the last path, the queue is drained, and every worker is joined
/// before the outcomes are read.
pub fn search(config: &SearchConfig) -> SearchResult<SearchOutput> {
    info!(
        "Starting search for {:?} in {} with {} workers",
        config.search_text,
        config.root_directory.display(),
        config.num_workers
    );

    if config.search_text.is_empty() {
        info!("Search text is empty, nothing to search");
        return Err(SearchError::EmptySearchText);
    }

    let root: PathBuf = config.root_directory.clone();
    let extensions = config.normalized_extensions();
    let output = run_pipeline(
        &config.search_text,
        config.num_workers.get(),
        move |queue, metrics| enumerate_files(&root, &extensions, queue, metrics),
        Worker::spawn,
    )?;

    let summary = output.summary();
    info!(
        "Search complete. Found {} matches in {} files",
        summary.total_matches, summary.files_with_matches
    );
    Ok(output)
}

fn run_pipeline<P, S>(
    search_text: &str,
    num_workers: usize,
    produce: P,
    spawn: S,
) -> SearchResult<SearchOutput>
where
    P: FnOnce(&WorkQueue, &SearchMetrics) -> usize + Send + 'static,
    S: FnMut(usize, WorkerContext) -> SearchResult<Worker>,
{
    let queue = Arc::new(WorkQueue::new());
    let store = Arc::new(ResultStore::new());
    let metrics = SearchMetrics::new();
    let context = WorkerContext::new(
        Arc::clone(&queue),
        Arc::clone(&store),
        search_text,
        metrics.clone(),
    );

    let producer = spawn_producer(produce, &queue, &metrics)?;
    let workers = match spawn_workers(num_workers, &context, spawn) {
        Ok(workers) => workers,
        Err((e, started)) => {
            // Let the workers that did start finish what the producer pushed
            let _ = join_producer(producer);
            send_shutdown(&queue, started.len());
            let _ = join_workers(started);
            return Err(e);
        }
    };
    drop(context);

    let producer_result = join_producer(producer);

    // Markers go in strictly after the last path
    send_shutdown(&queue, workers.len());
    wait_for_drain(&queue, &workers);

    let workers_result = join_workers(workers);
    producer_result?;
    workers_result?;

    let outcomes = Arc::try_unwrap(store)
        .map(ResultStore::into_outcomes)
        .unwrap_or_else(|store| store.snapshot());

    metrics.log_stats();
    Ok(SearchOutput {
        outcomes,
        stats: metrics.get_stats(),
    })
}

fn spawn_producer<P>(
    produce: P,
    queue: &Arc<WorkQueue>,
    metrics: &SearchMetrics,
) -> SearchResult<JoinHandle<usize>>
where
    P: FnOnce(&WorkQueue, &SearchMetrics) -> usize + Send + 'static,
{
    let queue = Arc::clone(queue);
    let metrics = metrics.clone();

    thread::Builder::new()
        .name("producer".to_string())
        .spawn(move || produce(&queue, &metrics))
        .map_err(|e| SearchError::worker_spawn("producer", e))
}

fn spawn_workers<S>(
    count: usize,
    context: &WorkerContext,
    mut spawn: S,
) -> Result<Vec<Worker>, (SearchError, Vec<Worker>)>
where
    S: FnMut(usize, WorkerContext) -> SearchResult<Worker>,
{
    let mut workers = Vec::with_capacity(count);
    for id in 1..=count {
        match spawn(id, context.clone()) {
            Ok(worker) => workers.push(worker),
            Err(e) => {
                error!("Failed to start worker {}: {}", id, e);
                return Err((e, workers));
            }
        }
    }
    debug!("Started {} workers", workers.len());
    Ok(workers)
}

fn join_producer(producer: JoinHandle<usize>) -> SearchResult<usize> {
    match producer.join() {
        Ok(count) => {
            debug!("Producer finished after enqueuing {} files", count);
            Ok(count)
        }
        Err(_) => {
            error!("Producer panicked; shutting down workers");
            Err(SearchError::thread_panicked("producer"))
        }
    }
}

fn send_shutdown(queue: &WorkQueue, count: usize) {
    debug!("Sending {} shutdown markers", count);
    for _ in 0..count {
        queue.push(WorkItem::Shutdown);
    }
}

/// Waits for every pushed item to be acknowledged.
///
/// A worker that died never takes its marker, so the wait also ends once
/// every worker thread has exited.
fn wait_for_drain(queue: &WorkQueue, workers: &[Worker]) {
    while !queue.wait_for_drain_timeout(DRAIN_POLL_INTERVAL) {
        if workers.iter().all(Worker::is_finished) {
            warn!(
                "All workers exited with {} items unacknowledged",
                queue.pending()
            );
            return;
        }
    }
    debug!("Work queue drained");
}

/// Joins every worker, returning the first failure after all have exited
fn join_workers(workers: Vec<Worker>) -> SearchResult<usize> {
    let mut first_error = None;
    let mut processed = 0;
    for worker in workers {
        match worker.join() {
            Ok(count) => processed += count,
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    debug!("All workers stopped after processing {} files", processed);
    first_error.map_or(Ok(processed), Err)
}
