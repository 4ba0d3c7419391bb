//! Rendering of finished searches.
//!
//! The pipeline never prints. Once every worker has stopped, the outcomes are
//! handed to a [`Reporter`], which writes them somewhere and returns the
//! aggregate [`Summary`].

use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};

use crate::results::{Outcome, Summary};

const SEPARATOR: &str = "--------------------------------------------------";

/// Receives the outcomes of a finished search
pub trait Reporter {
    fn report(&mut self, search_text: &str, outcomes: &[Outcome]) -> io::Result<Summary>;
}

/// Human-readable report: one block per file followed by the totals
#[derive(Debug)]
pub struct TextReporter<W: Write> {
    out: W,
    color: bool,
}

impl<W: Write> TextReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out, color: true }
    }

    /// Builder method to turn terminal colors on or off
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_outcome(&mut self, outcome: &Outcome) -> io::Result<()> {
        match outcome {
            Outcome::Error { file, message } => {
                let label = if self.color {
                    "[ERROR]".red().bold().to_string()
                } else {
                    "[ERROR]".to_string()
                };
                writeln!(self.out, "{} File: {}", label, file.display())?;
                writeln!(self.out, "        Message: {}", message)?;
            }
            Outcome::Matches { file, records } => {
                let path = file.display().to_string();
                if self.color {
                    writeln!(self.out, "[FILE] {}", path.blue())?;
                } else {
                    writeln!(self.out, "[FILE] {}", path)?;
                }
                for record in records {
                    let line_number = record.line_number.to_string();
                    if self.color {
                        writeln!(self.out, "  Line {}: {}", line_number.green(), record.line_text)?;
                    } else {
                        writeln!(self.out, "  Line {}: {}", line_number, record.line_text)?;
                    }
                }
            }
        }
        writeln!(self.out, "{}", SEPARATOR)
    }
}

impl<W: Write> Reporter for TextReporter<W> {
    fn report(&mut self, search_text: &str, outcomes: &[Outcome]) -> io::Result<Summary> {
        writeln!(self.out, "{}", SEPARATOR)?;
        writeln!(self.out, "Results for search text: {:?}", search_text)?;
        writeln!(self.out, "{}", SEPARATOR)?;

        for outcome in outcomes {
            self.write_outcome(outcome)?;
        }

        let summary = Summary::from_outcomes(outcomes);
        writeln!(self.out, "Files with matches: {}", summary.files_with_matches)?;
        writeln!(self.out, "Total matches:      {}", summary.total_matches)?;
        if summary.error_count > 0 {
            writeln!(self.out, "Files with errors:  {}", summary.error_count)?;
        }
        self.out.flush()?;
        Ok(summary)
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    search_text: &'a str,
    outcomes: &'a [Outcome],
    summary: Summary,
}

/// Machine-readable report: a single JSON document
#[derive(Debug)]
pub struct JsonReporter<W: Write> {
    out: W,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn report(&mut self, search_text: &str, outcomes: &[Outcome]) -> io::Result<Summary> {
        let summary = Summary::from_outcomes(outcomes);
        let report = JsonReport {
            search_text,
            outcomes,
            summary,
        };
        serde_json::to_writer_pretty(&mut self.out, &report)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(summary)
    }
}
