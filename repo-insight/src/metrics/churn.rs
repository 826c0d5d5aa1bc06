// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Per-file churn, hotspots, stale files, and the test-to-code ratio.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::round2;
use crate::{models::CommitDetail, time::days_ago};

/// Aggregated change history of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize,)]
pub struct FileChurn
{
    pub path:          String,
    pub additions:     u64,
    pub deletions:     u64,
    /// Added plus deleted lines across all commits.
    pub churn:         u64,
    /// Number of commits touching the file.
    pub commits:       u64,
    /// Latest commit instant touching the file.
    pub last_modified: Option<DateTime<Utc,>,>,
}

/// Folds commit details into per-file churn, highest churn first.
///
/// A file listed twice in one commit counts as one commit. The last-modified
/// instant is the maximum over all touching commits, independent of the order
/// in which commits arrive.
pub fn file_churn(details: &[CommitDetail],) -> Vec<FileChurn,>
{
    let mut files: HashMap<&str, FileChurn,> = HashMap::new();

    for detail in details {
        let mut touched = HashSet::new();
        for change in &detail.files {
            let entry = files.entry(change.path.as_str(),).or_insert_with(|| FileChurn {
                path:          change.path.clone(),
                additions:     0,
                deletions:     0,
                churn:         0,
                commits:       0,
                last_modified: None,
            },);

            entry.additions += change.additions;
            entry.deletions += change.deletions;
            entry.churn += change.churn();
            if touched.insert(change.path.as_str(),) {
                entry.commits += 1;
            }
            entry.last_modified = entry.last_modified.max(detail.timestamp,);
        }
    }

    let mut rows: Vec<FileChurn,> = files.into_values().collect();
    rows.sort_by(|a, b| b.churn.cmp(&a.churn,).then_with(|| a.path.cmp(&b.path,),),);
    rows
}

/// Files whose churn and commit count both reach their thresholds.
pub fn hotspots(files: &[FileChurn], churn_threshold: u64, commit_threshold: u64,) -> Vec<&FileChurn,>
{
    files
        .iter()
        .filter(|file| file.churn >= churn_threshold && file.commits >= commit_threshold,)
        .collect()
}

/// Files whose latest touching commit is older than `stale_days` before `now`.
///
/// Files without any dated commit are left out.
pub fn stale_files(files: &[FileChurn], now: DateTime<Utc,>, stale_days: u32,) -> Vec<&FileChurn,>
{
    let cutoff = days_ago(now, stale_days,);
    let mut stale: Vec<&FileChurn,> = files
        .iter()
        .filter(|file| file.last_modified.is_some_and(|last| last < cutoff,),)
        .collect();
    stale.sort_by(|a, b| a.last_modified.cmp(&b.last_modified,).then_with(|| a.path.cmp(&b.path,),),);
    stale
}

/// Returns `true` for paths that look like tests (`test` or `spec` anywhere,
/// case-insensitive).
pub fn is_test_path(path: &str,) -> bool
{
    let lower = path.to_ascii_lowercase();
    lower.contains("test",) || lower.contains("spec",)
}

/// Test files per production file, rounded to two decimals.
///
/// `None` when no production files are present.
pub fn test_to_code_ratio<'a, I,>(paths: I,) -> Option<f64,>
where
    I: IntoIterator<Item = &'a str,>,
{
    let (tests, production,) = paths.into_iter().fold((0u64, 0u64,), |(tests, production,), path| {
        if is_test_path(path,) { (tests + 1, production,) } else { (tests, production + 1,) }
    },);

    (production > 0).then(|| round2(tests as f64 / production as f64,),)
}

#[cfg(test)]
mod tests
{
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::models::FileChange;

    fn at(day: u32,) -> Option<DateTime<Utc,>,>
    {
        Some(Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0,).unwrap(),)
    }

    fn detail(timestamp: Option<DateTime<Utc,>,>, files: &[(&str, u64, u64,)],) -> CommitDetail
    {
        CommitDetail {
            sha: String::new(),
            author: "dev".to_owned(),
            timestamp,
            additions: 0,
            deletions: 0,
            verified: false,
            files: files
                .iter()
                .map(|(path, additions, deletions,)| FileChange {
                    path: (*path).to_owned(), additions: *additions, deletions: *deletions,
                },)
                .collect(),
        }
    }

    #[test]
    fn churn_sums_lines_and_counts_commits()
    {
        let rows = file_churn(&[
            detail(at(1,), &[("src/a.rs", 10, 5,), ("src/b.rs", 1, 0,),],),
            detail(at(2,), &[("src/a.rs", 3, 2,), ("src/a.rs", 1, 1,),],),
        ],);

        assert_eq!(rows[0].path, "src/a.rs");
        assert_eq!(rows[0].churn, 22);
        assert_eq!(rows[0].commits, 2);
        assert_eq!(rows[1].churn, 1);
        assert_eq!(rows[1].commits, 1);
    }

    #[test]
    fn last_modified_is_order_independent()
    {
        let newest_first = file_churn(&[detail(at(20,), &[("f", 1, 0,)],), detail(at(5,), &[("f", 1, 0,)],),],);
        let oldest_first = file_churn(&[detail(at(5,), &[("f", 1, 0,)],), detail(at(20,), &[("f", 1, 0,)],),],);
        assert_eq!(newest_first[0].last_modified, at(20));
        assert_eq!(oldest_first[0].last_modified, at(20));
    }

    #[test]
    fn hotspots_require_both_thresholds()
    {
        let row = |path: &str, churn: u64, commits: u64| FileChurn {
            path: path.to_owned(),
            additions: churn,
            deletions: 0,
            churn,
            commits,
            last_modified: None,
        };
        let files = vec![row("both", 600, 12,), row("big-once", 5000, 1,), row("busy-small", 20, 40,),];

        let found: Vec<&str,> = hotspots(&files, 500, 10,).into_iter().map(|f| f.path.as_str(),).collect();
        assert_eq!(found, vec!["both"]);
    }

    #[test]
    fn stale_files_use_cutoff_relative_to_now()
    {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0,).unwrap();
        let files = file_churn(&[
            detail(Some(now - Duration::days(200,),), &[("old.rs", 1, 0,)],),
            detail(Some(now - Duration::days(10,),), &[("fresh.rs", 1, 0,)],),
            detail(Some(now - Duration::days(400,),), &[("fresh.rs", 1, 0,)],),
            detail(None, &[("undated.rs", 1, 0,)],),
        ],);

        let stale: Vec<&str,> = stale_files(&files, now, 180,).into_iter().map(|f| f.path.as_str(),).collect();
        assert_eq!(stale, vec!["old.rs"]);
    }

    #[test]
    fn test_ratio_counts_test_and_spec_paths()
    {
        let ratio = test_to_code_ratio(["src/lib.rs", "tests/api.rs", "web/app.spec.ts", "src/main.rs", "src/x.rs",],);
        assert_eq!(ratio, Some(0.67));
        assert_eq!(test_to_code_ratio(["tests/only.rs",],), None);
        assert_eq!(test_to_code_ratio(std::iter::empty(),), None);
    }
}
