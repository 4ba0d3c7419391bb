use ignore::WalkBuilder;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::filters::has_valid_extension;
use crate::metrics::SearchMetrics;
use crate::queue::{WorkItem, WorkQueue};

/// Walks `root` and pushes every regular file with an allowed extension onto
/// the queue. Returns the number of paths pushed.
///
/// Hidden files and ignore files are not special: every file under `root` is
/// a candidate. Symlinks are not followed. A missing root is logged and
/// yields nothing. Shutdown markers are never pushed from here.
pub fn enumerate_files(
    root: &Path,
    extensions: &[String],
    queue: &WorkQueue,
    metrics: &SearchMetrics,
) -> usize {
    debug!("Walking directory: {}", root.display());

    if !root.is_dir() {
        warn!(
            "Root directory '{}' does not exist or is not a directory",
            root.display()
        );
        return 0;
    }

    let mut walker = WalkBuilder::new(root);
    walker.standard_filters(false).follow_links(false);

    let mut files_count = 0;
    for entry in walker.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        if !has_valid_extension(entry.path(), extensions) {
            continue;
        }

        debug!("Enqueuing file: {}", entry.path().display());
        queue.push(WorkItem::Path(entry.into_path()));
        metrics.record_enqueued();
        files_count += 1;
    }

    info!("Enumeration complete: {} files enqueued", files_count);
    files_count
}
