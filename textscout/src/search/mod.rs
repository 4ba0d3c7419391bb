/// The producer/worker search pipeline.
///
/// ```text
///                 ┌──────────────┐
///                 │  producer    │  walks the tree, filters by extension
///                 └──────┬───────┘
///                        │ WorkItem::Path
///                 ┌──────▼───────┐
///                 │  WorkQueue   │◄── WorkItem::Shutdown × N (coordinator)
///                 └──────┬───────┘
///        ┌───────────────┼───────────────┐
///  ┌─────▼─────┐   ┌─────▼─────┐   ┌─────▼─────┐
///  │ worker-1  │   │ worker-2  │   │ worker-N  │  scan, record, acknowledge
///  └─────┬─────┘   └─────┬─────┘   └─────┬─────┘
///        └───────────────┼───────────────┘
///                 ┌──────▼───────┐
///                 │ ResultStore  │──► Reporter
///                 └──────────────┘
/// ```
///
/// The coordinator ([`engine::search`]) waits at three barriers in order:
/// 1. The producer thread has exited, so every path is in the queue
/// 2. The queue is drained, so every path and marker has been acknowledged
/// 3. Every worker thread has exited
///
/// Only then is the result store read.
pub mod engine;
pub mod enumerator;
pub mod processor;
pub mod worker;

pub use engine::{run_search, search, SearchOutput};
pub use enumerator::enumerate_files;
pub use processor::{scan_file, scan_reader, FileProcessor, FileScan};
pub use worker::{Worker, WorkerContext, WorkerState};
