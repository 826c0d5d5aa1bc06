// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Commit and merge cadence.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::bus_factor::commit_counts;
use crate::{
    models::{Commit, CommitDetail, PullRequest},
    time::hours_between,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize,)]
pub struct AuthorCommits
{
    pub author:  String,
    pub commits: u64,
}

/// Repository activity over a trailing window.
#[derive(Debug, Clone, PartialEq, Serialize,)]
pub struct ActivitySummary
{
    pub window_days:               u32,
    pub total_commits:             usize,
    pub active_contributors:       usize,
    pub commits_per_day:           f64,
    pub avg_hours_between_commits: Option<f64,>,
    pub lines_added:               u64,
    pub lines_deleted:             u64,
    pub branches:                  usize,
}

/// Merge cadence over a trailing window.
#[derive(Debug, Clone, PartialEq, Serialize,)]
pub struct MergeFrequency
{
    pub window_days:              u32,
    pub merged:                   usize,
    pub per_day:                  f64,
    pub per_week:                 f64,
    pub avg_hours_between_merges: Option<f64,>,
}

/// Distinct commit authors.
pub fn active_contributors(commits: &[Commit],) -> usize
{
    commits.iter().map(|commit| commit.author.as_str(),).collect::<HashSet<_,>>().len()
}

/// Commits per author, most active first; ties ordered by author.
pub fn commit_frequency_by_author(commits: &[Commit],) -> Vec<AuthorCommits,>
{
    let mut rows: Vec<AuthorCommits,> = commit_counts(commits,)
        .into_iter()
        .map(|(author, commits,)| AuthorCommits {
            author, commits,
        },)
        .collect();
    rows.sort_by(|a, b| b.commits.cmp(&a.commits,).then_with(|| a.author.cmp(&b.author,),),);
    rows
}

/// Mean gap between consecutive instants in hours.
///
/// Instants are sorted first; `None` entries are ignored and fewer than two
/// instants yield `None`.
pub fn average_hours_between<I,>(instants: I,) -> Option<f64,>
where
    I: IntoIterator<Item = Option<DateTime<Utc,>,>,>,
{
    let mut sorted: Vec<DateTime<Utc,>,> = instants.into_iter().flatten().collect();
    if sorted.len() < 2 {
        return None;
    }
    sorted.sort();

    let (first, last,) = (sorted[0], sorted[sorted.len() - 1],);
    Some(hours_between(first, last,) / (sorted.len() - 1) as f64,)
}

/// Total added and deleted lines across commit details.
pub fn lines_changed(details: &[CommitDetail],) -> (u64, u64,)
{
    details
        .iter()
        .fold((0, 0,), |(added, deleted,), detail| (added + detail.additions, deleted + detail.deletions,),)
}

/// Builds the activity summary for a window of `window_days`.
pub fn activity_summary(
    commits: &[Commit],
    details: &[CommitDetail],
    branches: usize,
    window_days: u32,
) -> ActivitySummary
{
    let (lines_added, lines_deleted,) = lines_changed(details,);
    ActivitySummary {
        window_days,
        total_commits: commits.len(),
        active_contributors: active_contributors(commits,),
        commits_per_day: per_day(commits.len(), window_days,),
        avg_hours_between_commits: average_hours_between(commits.iter().map(|c| c.timestamp,),),
        lines_added,
        lines_deleted,
        branches,
    }
}

/// Merge cadence of pull requests merged within a window of `window_days`.
pub fn merge_frequency(merged: &[PullRequest], window_days: u32,) -> MergeFrequency
{
    let per_day = per_day(merged.len(), window_days,);
    MergeFrequency {
        window_days,
        merged: merged.len(),
        per_day,
        per_week: per_day * 7.0,
        avg_hours_between_merges: average_hours_between(merged.iter().map(|pull| pull.merged_at,),),
    }
}

fn per_day(count: usize, window_days: u32,) -> f64
{
    if window_days == 0 { 0.0 } else { count as f64 / f64::from(window_days,) }
}

#[cfg(test)]
mod tests
{
    use chrono::{Duration, TimeZone};

    use super::*;

    fn commit(author: &str, hour: i64,) -> Commit
    {
        Commit {
            sha:       format!("{author}{hour}"),
            author:    author.to_owned(),
            timestamp: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0,).unwrap() + Duration::hours(hour,),),
            verified:  false,
        }
    }

    #[test]
    fn frequency_sorts_by_count_then_author()
    {
        let commits = vec![commit("bob", 1,), commit("alice", 2,), commit("carol", 3,), commit("carol", 4,),];
        let rows = commit_frequency_by_author(&commits,);
        let order: Vec<(&str, u64,),> = rows.iter().map(|row| (row.author.as_str(), row.commits,),).collect();
        assert_eq!(order, vec![("carol", 2), ("alice", 1), ("bob", 1)]);
        assert_eq!(active_contributors(&commits,), 3);
    }

    #[test]
    fn average_gap_ignores_order_and_missing_instants()
    {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0,).unwrap();
        let gap = average_hours_between([
            Some(base + Duration::hours(10,),),
            None,
            Some(base,),
            Some(base + Duration::hours(4,),),
        ],);
        assert_eq!(gap, Some(5.0));
        assert_eq!(average_hours_between([Some(base,)],), None);
    }

    #[test]
    fn merge_frequency_scales_to_week()
    {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0,).unwrap();
        let merged: Vec<PullRequest,> = (0..14)
            .map(|day| PullRequest {
                merged_at: Some(base + Duration::days(day,),), ..PullRequest::default()
            },)
            .collect();

        let frequency = merge_frequency(&merged, 28,);
        assert_eq!(frequency.per_day, 0.5);
        assert_eq!(frequency.per_week, 3.5);
        assert_eq!(frequency.avg_hours_between_merges, Some(24.0));
    }

    #[test]
    fn summary_totals_lines()
    {
        let detail = |additions, deletions| CommitDetail {
            sha: String::new(),
            author: "dev".to_owned(),
            timestamp: None,
            additions,
            deletions,
            verified: false,
            files: Vec::new(),
        };
        let summary = activity_summary(&[commit("a", 0,), commit("a", 2,)], &[detail(5, 1,), detail(3, 3,)], 4, 90,);
        assert_eq!((summary.lines_added, summary.lines_deleted), (8, 4));
        assert_eq!(summary.avg_hours_between_commits, Some(2.0));
        assert_eq!(summary.active_contributors, 1);
        assert_eq!(summary.branches, 4);
    }
}
