use std::any::Any;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

use crate::errors::{SearchError, SearchResult};
use crate::metrics::SearchMetrics;
use crate::results::{MatchRecord, Outcome};

const BUFFER_CAPACITY: usize = 65536;
const LINE_CAPACITY: usize = 256;

/// Lines of one file that contain the search text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileScan {
    pub records: Vec<MatchRecord>,
    pub bytes_read: u64,
}

/// Scans `reader` line by line for `needle`.
///
/// `\n`, `\r\n` and a lone `\r` all end a line and are not part of the line
/// text. Invalid UTF-8 is replaced rather than reported. Only read failures
/// are errors.
pub fn scan_reader<R: BufRead>(mut reader: R, needle: &str) -> io::Result<FileScan> {
    let mut scan = FileScan::default();
    let mut chunk = Vec::with_capacity(LINE_CAPACITY);
    let mut line_number = 0;

    loop {
        chunk.clear();
        let read = reader.read_until(b'\n', &mut chunk)?;
        if read == 0 {
            break;
        }
        scan.bytes_read += read as u64;

        let terminated = chunk.last() == Some(&b'\n');
        if terminated {
            chunk.pop();
            if chunk.last() == Some(&b'\r') {
                chunk.pop();
            }
        }

        // Anything left of a lone \r is a line of its own
        let mut lines = chunk.split(|&b| b == b'\r').peekable();
        while let Some(line) = lines.next() {
            if lines.peek().is_none() && line.is_empty() && !terminated {
                break;
            }
            line_number += 1;
            let text = String::from_utf8_lossy(line);
            if text.contains(needle) {
                scan.records
                    .push(MatchRecord::new(line_number, text.into_owned()));
            }
        }
    }

    Ok(scan)
}

/// Opens `path` and scans it with [`scan_reader`]
pub fn scan_file(path: &Path, needle: &str) -> SearchResult<FileScan> {
    let file = File::open(path).map_err(|e| SearchError::from_file_io(path, e))?;
    let reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
    scan_reader(reader, needle).map_err(|e| SearchError::from_file_io(path, e))
}

/// Scans files for one search text and turns the result into an [`Outcome`]
#[derive(Debug, Clone)]
pub struct FileProcessor {
    search_text: Arc<str>,
    metrics: SearchMetrics,
}

impl FileProcessor {
    /// Creates a processor for `search_text` reporting into `metrics`
    pub fn new(search_text: impl Into<Arc<str>>, metrics: SearchMetrics) -> Self {
        Self {
            search_text: search_text.into(),
            metrics,
        }
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn metrics(&self) -> &SearchMetrics {
        &self.metrics
    }

    /// Opens and scans a single file
    pub fn process_file(&self, path: &Path) -> SearchResult<FileScan> {
        trace!("Scanning file: {}", path.display());
        scan_file(path, &self.search_text)
    }

    /// Scans a file and decides what, if anything, gets recorded for it.
    ///
    /// A panic while scanning is contained to this file and recorded as an
    /// error outcome.
    pub fn process_path(&self, path: &Path) -> Option<Outcome> {
        self.outcome_for(path, || self.process_file(path))
    }

    /// Runs `scan` for `path` inside an unwind boundary and turns its result
    /// into an outcome
    fn outcome_for<F>(&self, path: &Path, scan: F) -> Option<Outcome>
    where
        F: FnOnce() -> SearchResult<FileScan>,
    {
        let result = panic::catch_unwind(AssertUnwindSafe(scan));

        match result {
            Ok(Ok(scan)) => {
                self.metrics.record_scanned(scan.bytes_read);
                if scan.records.is_empty() {
                    debug!("No matches in {}", path.display());
                    return None;
                }
                debug!(
                    "Found {} matching lines in {}",
                    scan.records.len(),
                    path.display()
                );
                self.metrics.record_matches(scan.records.len());
                Some(Outcome::matches(path, scan.records))
            }
            Ok(Err(e)) => {
                warn!("Failed to read {}: {}", path.display(), e);
                self.metrics.record_scanned(0);
                self.metrics.record_error();
                Some(Outcome::error(path, e.to_string()))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("Internal fault while scanning {}: {}", path.display(), message);
                self.metrics.record_scanned(0);
                self.metrics.record_error();
                Some(Outcome::error(
                    path,
                    format!("internal fault while scanning: {}", message),
                ))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
