use anyhow::Result;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use textscout::report::TextReporter;
use textscout::search::search;
use textscout::{run_search, Outcome, SearchConfig, SearchError, Summary};

fn workers(count: usize) -> NonZeroUsize {
    NonZeroUsize::new(count).unwrap()
}

fn create_test_files(
    dir: &tempfile::TempDir,
    file_count: usize,
    lines_per_file: usize,
) -> Result<()> {
    for i in 0..file_count {
        let sub = dir.path().join(format!("dir_{}", i % 3));
        fs::create_dir_all(&sub)?;
        let file_path = sub.join(format!("test_{}.txt", i));
        let mut file = File::create(file_path)?;
        for j in 0..lines_per_file {
            writeln!(file, "Line {} in file {}: TODO implement this", j, i)?;
            writeln!(file, "Another line {} in file {}: nothing special", j, i)?;
            if j % 2 == 0 {
                writeln!(file, "FIXME: This is a bug in file {} line {}", i, j)?;
            }
        }
    }
    Ok(())
}

fn matched_files(outcomes: &[Outcome]) -> BTreeSet<PathBuf> {
    outcomes
        .iter()
        .filter(|o| !o.is_error())
        .map(|o| o.file().clone())
        .collect()
}

#[test]
fn test_end_to_end_extension_filter() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("a.txt"), "needle one\nhay\nneedle two\n")?;
    fs::write(dir.path().join("b.log"), "needle in a log\n")?;

    let config = SearchConfig::new(dir.path(), "needle").with_allowed_extensions([".txt"]);
    let output = search(&config)?;

    let summary = output.summary();
    assert_eq!(summary.files_with_matches, 1);
    assert_eq!(summary.total_matches, 2);
    assert!(output
        .outcomes
        .iter()
        .all(|o| o.file() != &dir.path().join("b.log")));
    Ok(())
}

#[test]
fn test_match_records_in_line_order() -> Result<()> {
    let dir = tempdir()?;
    let file = dir.path().join("lines.txt");
    fs::write(&file, "foo\nfoobar\nbaz\n")?;

    let output = search(&SearchConfig::new(dir.path(), "foo"))?;
    assert_eq!(output.outcomes.len(), 1);
    match &output.outcomes[0] {
        Outcome::Matches { file: path, records } => {
            assert_eq!(path, &file);
            let lines: Vec<(usize, &str)> = records
                .iter()
                .map(|r| (r.line_number, r.line_text.as_str()))
                .collect();
            assert_eq!(lines, vec![(1, "foo"), (2, "foobar")]);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    Ok(())
}

#[test]
fn test_completeness_of_enumeration() -> Result<()> {
    let dir = tempdir()?;
    let nested = dir.path().join("one").join("two");
    fs::create_dir_all(&nested)?;
    fs::create_dir_all(dir.path().join(".hidden"))?;

    let files = [
        dir.path().join("a.txt"),
        dir.path().join("B.TXT"),
        dir.path().join("c.Md"),
        nested.join("d.txt"),
        dir.path().join(".hidden").join("e.md"),
        dir.path().join("f.rs"),
        dir.path().join("noext"),
    ];
    for file in &files {
        fs::write(file, "marker\n")?;
    }
    // An ignore file must not hide anything
    fs::write(dir.path().join(".gitignore"), "*.txt\n")?;

    let config =
        SearchConfig::new(dir.path(), "marker").with_allowed_extensions(["txt", ".MD"]);
    let output = search(&config)?;

    let expected: BTreeSet<PathBuf> = files[..5].iter().cloned().collect();
    assert_eq!(matched_files(&output.outcomes), expected);
    assert_eq!(output.stats.files_enqueued, 5);

    let config = SearchConfig::new(dir.path(), "marker").with_allowed_extensions(Vec::<String>::new());
    let output = search(&config)?;
    let expected: BTreeSet<PathBuf> = files.iter().cloned().collect();
    assert_eq!(matched_files(&output.outcomes), expected);
    // .gitignore was enqueued and scanned too, it just does not match
    assert_eq!(output.stats.files_enqueued, 8);
    Ok(())
}

#[test]
fn test_no_loss_or_duplication() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, 60, 20)?;

    let config = SearchConfig::new(dir.path(), "TODO").with_num_workers(workers(6));
    let output = search(&config)?;

    assert_eq!(output.stats.files_enqueued, 60);
    assert_eq!(output.stats.files_scanned, 60);
    assert_eq!(output.stats.markers_consumed, 6);
    assert_eq!(output.outcomes.len(), 60);
    assert_eq!(matched_files(&output.outcomes).len(), 60);
    Ok(())
}

#[test]
fn test_concurrency_invariance() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, 40, 25)?;

    let summaries: Vec<Summary> = [1, 2, 8]
        .into_iter()
        .map(|count| {
            let config = SearchConfig::new(dir.path(), "FIXME").with_num_workers(workers(count));
            search(&config).map(|output| output.summary())
        })
        .collect::<Result<_, _>>()?;

    assert_eq!(summaries[0].files_with_matches, 40);
    assert_eq!(summaries[0].total_matches, 40 * 13);
    assert!(summaries.iter().all(|s| *s == summaries[0]));
    Ok(())
}

#[test]
fn test_empty_search_text_never_reports() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("a.txt"), "anything\n")?;

    let config = SearchConfig::new(dir.path(), "");
    assert!(matches!(search(&config), Err(SearchError::EmptySearchText)));

    let mut reporter = TextReporter::new(Vec::new()).with_color(false);
    assert_eq!(run_search(&config, &mut reporter)?, None);
    assert!(reporter.into_inner().is_empty());
    Ok(())
}

#[test]
fn test_run_search_reports_outcomes() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("a.txt"), "needle\nneedle\n")?;
    fs::write(dir.path().join("b.txt"), "nothing\n")?;

    let config = SearchConfig::new(dir.path(), "needle").with_num_workers(workers(4));
    let mut reporter = TextReporter::new(Vec::new()).with_color(false);
    let summary = run_search(&config, &mut reporter)?.expect("search should run");

    assert_eq!(summary.files_with_matches, 1);
    assert_eq!(summary.total_matches, 2);
    let output = String::from_utf8(reporter.into_inner())?;
    assert!(output.contains("Line 1: needle"));
    assert!(output.contains("Line 2: needle"));
    assert!(!output.contains("b.txt"));
    Ok(())
}

#[test]
fn test_missing_root_is_not_an_error() -> Result<()> {
    let dir = tempdir()?;
    let config = SearchConfig::new(dir.path().join("missing"), "x");
    let output = search(&config)?;
    assert!(output.outcomes.is_empty());
    assert_eq!(output.summary(), Summary::default());
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_records_one_error() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir()?;
    let locked = dir.path().join("locked.txt");
    fs::write(&locked, "needle\n")?;
    fs::write(dir.path().join("open.txt"), "needle\n")?;
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;

    // Privileged users can read the file anyway; nothing to observe then
    if File::open(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644))?;
        return Ok(());
    }

    let output = search(&SearchConfig::new(dir.path(), "needle").with_num_workers(workers(2)))?;
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644))?;

    let for_locked: Vec<&Outcome> = output
        .outcomes
        .iter()
        .filter(|o| o.file() == &locked)
        .collect();
    assert_eq!(for_locked.len(), 1);
    assert!(matches!(
        for_locked[0],
        Outcome::Error { message, .. } if message.starts_with("Permission denied")
    ));

    let summary = output.summary();
    assert_eq!(summary.files_with_matches, 1);
    assert_eq!(summary.error_count, 1);
    Ok(())
}

#[test]
fn test_lossy_decoding_still_matches() -> Result<()> {
    let dir = tempdir()?;
    let path: &Path = &dir.path().join("binaryish.txt");
    fs::write(path, b"\xff\xfeneedle\x00\x01\nplain\n\x80needle\n")?;

    let output = search(&SearchConfig::new(dir.path(), "needle"))?;
    let summary = output.summary();
    assert_eq!(summary.error_count, 0);
    assert_eq!(summary.total_matches, 2);
    Ok(())
}
