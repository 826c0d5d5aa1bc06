// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! CSV encoding of report tables.

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path
};

use super::Table;
use crate::{
    error::{self, Error},
    metrics::{Granularity, TimeBuckets}
};

/// Writes `table` to `path`, creating parent directories as needed.
///
/// The header row is always written, so an empty table still yields a valid
/// file with column names.
///
/// # Errors
///
/// Returns [`Error::ReportIo`] when the directory or file cannot be created and
/// [`Error::Report`] when the encoder rejects a record.
pub fn write_table(path: &Path, table: &Table) -> Result<(), Error> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| error::report_io_error(parent, source))?;
    }

    let file = File::create(path).map_err(|source| error::report_io_error(path, source))?;
    let mut writer = ::csv::Writer::from_writer(BufWriter::new(file));

    writer
        .write_record(&table.headers)
        .map_err(|e| Error::report(path, e.to_string()))?;
    for row in &table.rows {
        writer
            .write_record(row)
            .map_err(|e| Error::report(path, e.to_string()))?;
    }

    let mut inner = writer
        .into_inner()
        .map_err(|e| Error::report(path, e.to_string()))?;
    inner
        .flush()
        .map_err(|source| error::report_io_error(path, source))
}

/// Three-column `metric_name,metric_value,notes` table.
pub fn summary_table<I>(rows: I) -> Table
where
    I: IntoIterator<Item = (&'static str, String, &'static str)>
{
    let mut table = Table::new(&["metric_name", "metric_value", "notes"]);
    for (name, value, notes) in rows {
        table.push(vec![name.to_owned(), value, notes.to_owned()]);
    }
    table
}

/// Long-format histogram: one row per bucket, days first, then weeks, then
/// months, each in chronological order.
pub fn time_distribution(buckets: &TimeBuckets, count_column: &str) -> Table {
    let mut table = Table::new(&["time_granularity", "time_key", count_column]);
    for granularity in [Granularity::Day, Granularity::Week, Granularity::Month] {
        for (key, count) in buckets.sorted(granularity) {
            table.push(vec![granularity.as_str().to_owned(), key.to_owned(), count.to_string()]);
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn writes_header_and_rows_into_nested_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/out/summary.csv");
        let table = summary_table([
            ("open_issues", "4".to_owned(), ""),
            ("label_ratio", "N/A".to_owned(), "bugs per feature, heuristic")
        ]);

        write_table(&path, &table).expect("write csv");

        let contents = fs::read_to_string(&path).expect("read csv");
        assert_eq!(
            contents,
            "metric_name,metric_value,notes\nopen_issues,4,\nlabel_ratio,N/A,\"bugs per feature, heuristic\"\n"
        );
    }

    #[test]
    fn empty_table_keeps_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("hotspot_files.csv");

        write_table(&path, &Table::new(&["file", "churn"])).expect("write csv");

        assert_eq!(fs::read_to_string(&path).expect("read csv"), "file,churn\n");
    }

    #[test]
    fn unwritable_target_is_report_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"file, not a directory").expect("write blocker");

        let err = write_table(&blocker.join("x.csv"), &Table::new(&["a"])).expect_err("must fail");
        assert!(matches!(err, Error::ReportIo { .. }));
    }

    #[test]
    fn distribution_lists_weeks_chronologically() {
        let instants = [
            Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap()
        ];
        let buckets = TimeBuckets::from_instants(instants.into_iter().map(Some));
        let table = time_distribution(&buckets, "merged_count");

        assert_eq!(table.headers, vec!["time_granularity", "time_key", "merged_count"]);
        let weeks: Vec<&str> = table
            .rows
            .iter()
            .filter(|row| row[0] == "week")
            .map(|row| row[1].as_str())
            .collect();
        assert_eq!(weeks, vec!["2024-W1", "2024-W11"]);
        assert_eq!(table.rows.len(), 6);
    }
}
