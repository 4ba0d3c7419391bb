/// Result types produced by the search workers.
///
/// Every file a worker dequeues yields at most one [`Outcome`]: a list of
/// matching lines, or the error that kept the file from being read. Files
/// without matches leave no trace. Outcomes are collected in a
/// [`ResultStore`] that all workers share through an `Arc`:
///
/// ```rust,ignore
/// let store = Arc::new(ResultStore::new());
/// // each worker
/// store.append(Outcome::matches(path, records));
/// // coordinator, after every worker has been joined
/// let outcomes = Arc::try_unwrap(store)?.into_outcomes();
/// ```
///
/// The store makes no promise about ordering across workers. Appends from a
/// single worker keep their relative order.
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A single matching line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    /// The 1-based line number
    pub line_number: usize,
    /// The line text without its line terminator
    pub line_text: String,
}

impl MatchRecord {
    pub fn new(line_number: usize, line_text: impl Into<String>) -> Self {
        Self {
            line_number,
            line_text: line_text.into(),
        }
    }
}

/// The recorded result for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// The file was read and at least one line matched
    Matches {
        file: PathBuf,
        records: Vec<MatchRecord>,
    },
    /// The file could not be opened or read
    Error { file: PathBuf, message: String },
}

impl Outcome {
    pub fn matches(file: impl Into<PathBuf>, records: Vec<MatchRecord>) -> Self {
        Self::Matches {
            file: file.into(),
            records,
        }
    }

    pub fn error(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Error {
            file: file.into(),
            message: message.into(),
        }
    }

    /// The file this outcome belongs to
    pub fn file(&self) -> &PathBuf {
        match self {
            Self::Matches { file, .. } | Self::Error { file, .. } => file,
        }
    }

    /// Number of matching lines; zero for errors
    pub fn match_count(&self) -> usize {
        match self {
            Self::Matches { records, .. } => records.len(),
            Self::Error { .. } => 0,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Mutex-guarded collection of outcomes shared by all workers
#[derive(Debug, Default)]
pub struct ResultStore {
    outcomes: Mutex<Vec<Outcome>>,
}

impl ResultStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Outcome>> {
        self.outcomes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an outcome; the lock is held only for the push
    pub fn append(&self, outcome: Outcome) {
        self.lock().push(outcome);
    }

    /// Copies out every outcome recorded so far
    pub fn snapshot(&self) -> Vec<Outcome> {
        self.lock().clone()
    }

    /// Consumes the store and returns its outcomes
    pub fn into_outcomes(self) -> Vec<Outcome> {
        self.outcomes
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Aggregate counts over a set of outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Files with at least one matching line
    pub files_with_matches: usize,
    /// Matching lines across all files
    pub total_matches: usize,
    /// Files that could not be read
    pub error_count: usize,
}

impl Summary {
    /// Computes the summary for a snapshot. Pure; calling it twice on the same
    /// outcomes gives the same counts.
    pub fn from_outcomes(outcomes: &[Outcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut summary, outcome| {
            match outcome {
                Outcome::Matches { records, .. } => {
                    summary.files_with_matches += 1;
                    summary.total_matches += records.len();
                }
                Outcome::Error { .. } => summary.error_count += 1,
            }
            summary
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn sample_outcomes() -> Vec<Outcome> {
        vec![
            Outcome::matches(
                "a.txt",
                vec![MatchRecord::new(1, "foo"), MatchRecord::new(2, "foobar")],
            ),
            Outcome::error("locked.txt", "Permission denied: locked.txt"),
            Outcome::matches("b.txt", vec![MatchRecord::new(7, "more foo")]),
        ]
    }

    #[test]
    fn test_outcome_accessors() {
        let outcomes = sample_outcomes();
        assert_eq!(outcomes[0].file(), &PathBuf::from("a.txt"));
        assert_eq!(outcomes[0].match_count(), 2);
        assert!(!outcomes[0].is_error());
        assert_eq!(outcomes[1].match_count(), 0);
        assert!(outcomes[1].is_error());
    }

    #[test]
    fn test_summary_counts() {
        let summary = Summary::from_outcomes(&sample_outcomes());
        assert_eq!(summary.files_with_matches, 2);
        assert_eq!(summary.total_matches, 3);
        assert_eq!(summary.error_count, 1);
    }

    #[test]
    fn test_summary_is_idempotent() {
        let store = ResultStore::new();
        for outcome in sample_outcomes() {
            store.append(outcome);
        }

        let snapshot = store.snapshot();
        let first = Summary::from_outcomes(&snapshot);
        let second = Summary::from_outcomes(&snapshot);
        assert_eq!(first, second);
        assert_eq!(Summary::from_outcomes(&[]), Summary::default());
    }

    #[test]
    fn test_store_snapshot_and_into_outcomes() {
        let store = ResultStore::new();
        assert!(store.is_empty());

        for outcome in sample_outcomes() {
            store.append(outcome);
        }
        assert_eq!(store.len(), 3);
        assert_eq!(store.snapshot(), sample_outcomes());
        assert_eq!(store.into_outcomes(), sample_outcomes());
    }

    #[test]
    fn test_concurrent_appends_keep_per_worker_order() {
        let store = Arc::new(ResultStore::new());
        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for line in 1..=50 {
                        store.append(Outcome::matches(
                            format!("worker_{}.txt", worker),
                            vec![MatchRecord::new(line, "x")],
                        ));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let outcomes = store.snapshot();
        assert_eq!(outcomes.len(), 200);
        for worker in 0..4 {
            let file = PathBuf::from(format!("worker_{}.txt", worker));
            let lines: Vec<usize> = outcomes
                .iter()
                .filter(|o| o.file() == &file)
                .filter_map(|o| match o {
                    Outcome::Matches { records, .. } => Some(records[0].line_number),
                    Outcome::Error { .. } => None,
                })
                .collect();
            assert_eq!(lines, (1..=50).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(&sample_outcomes()[0]).unwrap();
        assert_eq!(json["kind"], "matches");
        assert_eq!(json["file"], "a.txt");
        assert_eq!(json["records"][1]["line_number"], 2);
        assert_eq!(json["records"][1]["line_text"], "foobar");

        let json = serde_json::to_value(&sample_outcomes()[1]).unwrap();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["message"], "Permission denied: locked.txt");
    }
}
