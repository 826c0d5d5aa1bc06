// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Report tables and the exporter that writes them.
//!
//! Every data set is first laid out as a [`Table`] of display strings. The
//! same tables feed both the CSV files and the PDF sections, so the two
//! outputs never disagree.

pub mod csv;
pub mod pdf;
pub mod tables;

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{info, warn};

use crate::{error::Error, metrics::round2};

/// Placeholder rendered for missing values.
pub const MISSING: &str = "N/A";

/// Rectangular table of display strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows:    Vec<Vec<String>>
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|header| (*header).to_owned()).collect(),
            rows:    Vec::new()
        }
    }

    /// Appends a row; short rows are padded with empty cells.
    pub fn push(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len().max(row.len()), String::new());
        self.rows.push(row);
    }

    /// Two-column `metric,value` table.
    pub fn key_value<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, String)>
    {
        let mut table = Self::new(&["metric", "value"]);
        for (metric, value) in pairs {
            table.push(vec![metric.to_owned(), value]);
        }
        table
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Titled table, optionally bound to a fixed CSV file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// File name inside the output directory, e.g. `hotspot_files.csv`.
    /// `None` for sections that only appear in the PDF.
    pub file_name: Option<&'static str>,
    /// Heading used in the PDF document.
    pub title:     String,
    pub table:     Table
}

impl Artifact {
    pub fn new(file_name: &'static str, title: impl Into<String>, table: Table) -> Self {
        Self {
            file_name: Some(file_name),
            title: title.into(),
            table
        }
    }

    /// Section rendered only in the PDF.
    pub fn document(title: impl Into<String>, table: Table) -> Self {
        Self {
            file_name: None,
            title: title.into(),
            table
        }
    }
}

/// Formats a float rounded to two decimals.
pub fn number(value: f64) -> String {
    round2(value).to_string()
}

/// Formats an optional float, `N/A` when absent.
pub fn optional_number(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_owned(), number)
}

/// Formats an optional count, `N/A` when absent.
pub fn optional_count<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| MISSING.to_owned(), |value| value.to_string())
}

/// Formats an instant as RFC 3339 with a `Z` suffix, empty when absent.
pub fn timestamp(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|instant| instant.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

/// Runs export steps, logging and skipping the ones that fail.
#[derive(Debug)]
pub struct Exporter {
    output_dir: PathBuf,
    written:    Vec<PathBuf>,
    failed:     Vec<(PathBuf, String)>
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            written:    Vec::new(),
            failed:     Vec::new()
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Runs `write` against `<output_dir>/<file_name>`.
    ///
    /// A failure is logged as a warning and recorded; the caller continues.
    pub fn export<F>(&mut self, file_name: &str, write: F) -> bool
    where
        F: FnOnce(&Path) -> Result<(), Error>
    {
        let path = self.output_dir.join(file_name);
        match write(&path) {
            Ok(()) => {
                info!("wrote {}", path.display());
                self.written.push(path);
                true
            }
            Err(e) => {
                warn!("skipping {}: {}", path.display(), e);
                self.failed.push((path, e.to_string()));
                false
            }
        }
    }

    /// Writes an artifact as CSV; document-only artifacts are skipped.
    pub fn write_csv(&mut self, artifact: &Artifact) -> bool {
        match artifact.file_name {
            Some(file_name) => self.export(file_name, |path| csv::write_table(path, &artifact.table)),
            None => false
        }
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn failed(&self) -> &[(PathBuf, String)] {
        &self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_round_and_missing_values_render_placeholder() {
        assert_eq!(number(2.0 / 3.0), "0.67");
        assert_eq!(optional_number(None), "N/A");
        assert_eq!(optional_number(Some(4.0)), "4");
        assert_eq!(optional_count::<usize>(None), "N/A");
        assert_eq!(timestamp(None), "");
    }

    #[test]
    fn short_rows_are_padded() {
        let mut table = Table::new(&["a", "b", "c"]);
        table.push(vec!["1".to_owned()]);
        assert_eq!(table.rows[0], vec!["1".to_owned(), String::new(), String::new()]);
    }

    #[test]
    fn exporter_records_failures_and_continues() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut exporter = Exporter::new(dir.path());

        let failed = exporter.export("broken.csv", |path| Err(Error::report(path, "encoder exploded")));
        let table = Table::key_value([("open_issues", "3".to_owned())]);
        let written = exporter.write_csv(&Artifact::new("issue_summary_metrics.csv", "Issues", table));

        assert!(!failed);
        assert!(written);
        assert_eq!(exporter.failed().len(), 1);
        assert!(exporter.failed()[0].1.contains("encoder exploded"));
        assert_eq!(exporter.written(), &[dir.path().join("issue_summary_metrics.csv")]);
    }
}
