// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Issue backlog metrics.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use super::round2;
use crate::{
    models::{Issue, IssueState},
    time::days_between,
};

const BUG_TOKENS: [&str; 3] = ["bug", "kind:bug", "type:bug"];
const FEATURE_TOKENS: [&str; 5] =
    ["feature", "enhancement", "kind:feature", "type:feature", "type:enhancement"];

/// Issues classified by label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize,)]
pub struct BugFeatureSplit
{
    pub bugs:     u64,
    pub features: u64,
    /// `bugs / features` to two decimals, `None` without features.
    pub ratio:    Option<f64,>,
}

#[derive(Debug, Clone, PartialEq, Serialize,)]
pub struct IssueSummary
{
    pub open:                u64,
    pub closed:              u64,
    /// `open / (open + closed)` to two decimals, `0` when empty.
    pub open_closed_ratio:   f64,
    /// Mean days from creation to close, `0` when no issue qualifies.
    pub avg_resolution_days: f64,
    pub labels:              BugFeatureSplit,
}

/// Issues created and closed per fixed-length sprint, keyed by sprint start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize,)]
pub struct SprintThroughput
{
    pub sprint_days: u32,
    pub created:     BTreeMap<NaiveDate, u64,>,
    pub closed:      BTreeMap<NaiveDate, u64,>,
}

impl SprintThroughput
{
    /// Every sprint start present in either map, ascending.
    pub fn sprints(&self,) -> Vec<NaiveDate,>
    {
        let mut starts: Vec<NaiveDate,> = self.created.keys().chain(self.closed.keys(),).copied().collect();
        starts.sort();
        starts.dedup();
        starts
    }
}

/// Open share of all issues.
pub fn open_closed_ratio(issues: &[Issue],) -> (u64, u64, f64,)
{
    let open = issues.iter().filter(|issue| issue.state == IssueState::Open,).count() as u64;
    let closed = issues.len() as u64 - open;
    let total = open + closed;
    let ratio = if total == 0 { 0.0 } else { round2(open as f64 / total as f64,) };
    (open, closed, ratio,)
}

/// Mean resolution time of closed issues in days, to two decimals.
pub fn average_resolution_days(issues: &[Issue],) -> f64
{
    let durations: Vec<f64,> = issues
        .iter()
        .filter(|issue| issue.state == IssueState::Closed,)
        .filter_map(|issue| Some(days_between(issue.created_at?, issue.closed_at?,),),)
        .collect();

    super::mean(&durations,).map(round2,).unwrap_or(0.0,)
}

/// Classifies issues by substring match on lowercased label names.
///
/// This is a heuristic: any label containing `bug` counts as a bug, so
/// `bugfix-candidate` does too. An issue matching both lists is a bug.
pub fn bug_vs_feature(issues: &[Issue],) -> BugFeatureSplit
{
    let mut bugs = 0;
    let mut features = 0;

    for issue in issues {
        let labels: Vec<String,> = issue.labels.iter().map(|label| label.to_lowercase(),).collect();
        let matches = |tokens: &[&str]| labels.iter().any(|label| tokens.iter().any(|token| label.contains(token,),),);

        if matches(BUG_TOKENS.as_slice(),) {
            bugs += 1;
        } else if matches(FEATURE_TOKENS.as_slice(),) {
            features += 1;
        }
    }

    BugFeatureSplit {
        bugs,
        features,
        ratio: (features > 0).then(|| round2(bugs as f64 / features as f64,),),
    }
}

pub fn issue_summary(issues: &[Issue],) -> IssueSummary
{
    let (open, closed, open_closed_ratio,) = open_closed_ratio(issues,);
    IssueSummary {
        open,
        closed,
        open_closed_ratio,
        avg_resolution_days: average_resolution_days(issues,),
        labels: bug_vs_feature(issues,),
    }
}

/// Buckets issue creation and closing into sprints of `sprint_days`.
///
/// Sprints are anchored at the earliest creation instant. Issues without a
/// creation instant are ignored; a close before the anchor falls into a sprint
/// that starts before it.
pub fn sprint_throughput(issues: &[Issue], sprint_days: u32,) -> SprintThroughput
{
    let mut throughput = SprintThroughput {
        sprint_days, ..SprintThroughput::default()
    };
    let Some(anchor,) = issues.iter().filter_map(|issue| issue.created_at,).min() else {
        return throughput;
    };
    if sprint_days == 0 {
        return throughput;
    }

    let sprint_start = |instant: DateTime<Utc,>| {
        let elapsed_days = (instant - anchor).num_seconds().div_euclid(86_400,);
        let index = elapsed_days.div_euclid(i64::from(sprint_days,),);
        (anchor + Duration::days(index * i64::from(sprint_days,),)).date_naive()
    };

    for issue in issues {
        let Some(created,) = issue.created_at else {
            continue;
        };
        *throughput.created.entry(sprint_start(created,),).or_default() += 1;
        if let Some(closed,) = issue.closed_at {
            *throughput.closed.entry(sprint_start(closed,),).or_default() += 1;
        }
    }

    throughput
}

#[cfg(test)]
mod tests
{
    use chrono::TimeZone;

    use super::*;

    fn issue(state: IssueState, created: Option<(u32, u32,),>, closed: Option<(u32, u32,),>, labels: &[&str],) -> Issue
    {
        let at = |(month, day,): (u32, u32,)| Utc.with_ymd_and_hms(2024, month, day, 12, 0, 0,).unwrap();
        Issue {
            number: 1,
            title: String::new(),
            state,
            author: None,
            created_at: created.map(at,),
            closed_at: closed.map(at,),
            labels: labels.iter().map(|label| (*label).to_owned(),).collect(),
            comments: 0,
        }
    }

    #[test]
    fn ratio_and_resolution()
    {
        let issues = vec![
            issue(IssueState::Open, Some((1, 1,),), None, &[],),
            issue(IssueState::Closed, Some((1, 1,),), Some((1, 3,),), &[],),
            issue(IssueState::Closed, Some((1, 1,),), Some((1, 2,),), &[],),
        ];
        let summary = issue_summary(&issues,);
        assert_eq!((summary.open, summary.closed), (1, 2));
        assert_eq!(summary.open_closed_ratio, 0.33);
        assert_eq!(summary.avg_resolution_days, 1.5);
    }

    #[test]
    fn empty_backlog_is_zero()
    {
        let summary = issue_summary(&[],);
        assert_eq!(summary.open_closed_ratio, 0.0);
        assert_eq!(summary.avg_resolution_days, 0.0);
        assert_eq!(summary.labels.ratio, None);
    }

    #[test]
    fn label_heuristic_prefers_bug_and_matches_substrings()
    {
        let issues = vec![
            issue(IssueState::Open, None, None, &["Bug",],),
            issue(IssueState::Open, None, None, &["bugfix-candidate",],),
            issue(IssueState::Open, None, None, &["enhancement", "type:bug",],),
            issue(IssueState::Open, None, None, &["Feature Request",],),
            issue(IssueState::Open, None, None, &["docs",],),
        ];
        let split = bug_vs_feature(&issues,);
        assert_eq!(split.bugs, 3);
        assert_eq!(split.features, 1);
        assert_eq!(split.ratio, Some(3.0));
    }

    #[test]
    fn sprints_are_anchored_at_first_creation()
    {
        let issues = vec![
            issue(IssueState::Closed, Some((1, 1,),), Some((1, 20,),), &[],),
            issue(IssueState::Open, Some((1, 14,),), None, &[],),
            issue(IssueState::Open, Some((1, 15,),), None, &[],),
            issue(IssueState::Open, None, None, &[],),
        ];
        let throughput = sprint_throughput(&issues, 14,);

        let jan = |day| NaiveDate::from_ymd_opt(2024, 1, day,).unwrap();
        assert_eq!(throughput.created.get(&jan(1,)), Some(&2));
        assert_eq!(throughput.created.get(&jan(15,)), Some(&1));
        assert_eq!(throughput.closed.get(&jan(15,)), Some(&1));
        assert_eq!(throughput.sprints(), vec![jan(1,), jan(15,)]);
    }
}
