// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Pull request efficiency, reopen rate, and review quality.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{lead_time::percentile, mean};
use crate::{models::PullRequest, time::hours_between};

/// Length of the largest and slowest pull request lists.
pub const TOP_PULL_REQUESTS: usize = 25;

/// Merged versus closed pull requests in a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize,)]
pub struct MergeEfficiency
{
    /// Closed pull requests, merged or not.
    pub closed:            u64,
    pub merged:            u64,
    pub closed_not_merged: u64,
    /// `merged / closed`, `None` when nothing was closed.
    pub merge_rate:        Option<f64,>,
}

/// Derives efficiency from search counts.
pub fn merge_efficiency(closed: u64, merged: u64,) -> MergeEfficiency
{
    MergeEfficiency {
        closed,
        merged,
        closed_not_merged: closed.saturating_sub(merged,),
        merge_rate: (closed > 0).then(|| merged as f64 / closed as f64,),
    }
}

/// Pull request reopened within the window.
#[derive(Debug, Clone, PartialEq, Serialize,)]
pub struct ReopenedPull
{
    pub number:      u64,
    pub title:       String,
    pub url:         String,
    pub author:      Option<String,>,
    /// Latest reopen inside the window.
    pub reopened_at: DateTime<Utc,>,
    pub closed_at:   Option<DateTime<Utc,>,>,
}

#[derive(Debug, Clone, PartialEq, Serialize,)]
pub struct ReopenSummary
{
    pub closed:        u64,
    pub reopen_events: usize,
    /// `reopened.len() / closed`, `None` when nothing was closed.
    pub reopen_rate:   Option<f64,>,
    pub reopened:      Vec<ReopenedPull,>,
}

/// Counts pull requests with at least one reopen event at or after `since`.
pub fn reopen_summary(candidates: &[PullRequest], closed: u64, since: DateTime<Utc,>,) -> ReopenSummary
{
    let mut reopen_events = 0;
    let mut reopened = Vec::new();

    for pull in candidates {
        let in_window: Vec<DateTime<Utc,>,> = pull.reopened_at.iter().copied().filter(|at| *at >= since,).collect();
        reopen_events += in_window.len();

        if let Some(latest,) = in_window.into_iter().max() {
            reopened.push(ReopenedPull {
                number:      pull.number,
                title:       pull.title.clone(),
                url:         pull.url.clone(),
                author:      pull.author.clone(),
                reopened_at: latest,
                closed_at:   pull.closed_at,
            },);
        }
    }
    reopened.sort_by(|a, b| b.reopened_at.cmp(&a.reopened_at,),);

    ReopenSummary {
        closed,
        reopen_events,
        reopen_rate: (closed > 0).then(|| reopened.len() as f64 / closed as f64,),
        reopened,
    }
}

/// Review statistics of a single pull request.
#[derive(Debug, Clone, PartialEq, Serialize,)]
pub struct ReviewRow
{
    pub number:                  u64,
    pub url:                     String,
    pub title:                   String,
    pub author:                  Option<String,>,
    pub is_draft:                bool,
    pub created_at:              Option<DateTime<Utc,>,>,
    pub merged_at:               Option<DateTime<Utc,>,>,
    pub closed_at:               Option<DateTime<Utc,>,>,
    pub additions:               u64,
    pub deletions:               u64,
    pub loc_changed:             u64,
    pub changed_files:           u64,
    /// Distinct reviewers other than the author.
    pub reviewers:               usize,
    /// Distinct reviewers other than the author who approved.
    pub approvals:               usize,
    pub first_review_at:         Option<DateTime<Utc,>,>,
    pub review_turnaround_hours: Option<f64,>,
    pub issue_comments:          u64,
    pub review_threads:          u64,
    pub total_comments:          u64,
}

impl ReviewRow
{
    pub fn from_pull_request(pull: &PullRequest,) -> Self
    {
        let author = pull.author.as_deref();
        let mut reviewers = HashSet::new();
        let mut approvers = HashSet::new();
        let mut first_review_at: Option<DateTime<Utc,>,> = None;

        for review in &pull.reviews {
            let Some(reviewer,) = review.author.as_deref() else {
                continue;
            };
            if Some(reviewer,) == author {
                continue;
            }

            reviewers.insert(reviewer,);
            if review.is_approval() {
                approvers.insert(reviewer,);
            }
            if let Some(submitted,) = review.submitted_at {
                first_review_at = Some(first_review_at.map_or(submitted, |first| first.min(submitted,),),);
            }
        }

        let review_turnaround_hours = match (pull.created_at, first_review_at,) {
            (Some(created,), Some(first,),) => Some(hours_between(created, first,),),
            _ => None,
        };

        Self {
            number: pull.number,
            url: pull.url.clone(),
            title: pull.title.clone(),
            author: pull.author.clone(),
            is_draft: pull.is_draft,
            created_at: pull.created_at,
            merged_at: pull.merged_at,
            closed_at: pull.closed_at,
            additions: pull.additions,
            deletions: pull.deletions,
            loc_changed: pull.additions + pull.deletions,
            changed_files: pull.changed_files,
            reviewers: reviewers.len(),
            approvals: approvers.len(),
            first_review_at,
            review_turnaround_hours,
            issue_comments: pull.issue_comments,
            review_threads: pull.review_threads,
            total_comments: pull.issue_comments + pull.review_threads,
        }
    }
}

/// Review quality across pull requests created in a window.
///
/// Averages, medians, and the approval rate cover non-draft pull requests
/// only.
#[derive(Debug, Clone, PartialEq, Serialize,)]
pub struct PullRequestQuality
{
    pub pull_requests:           usize,
    pub non_draft:               usize,
    pub avg_turnaround_hours:    Option<f64,>,
    pub median_turnaround_hours: Option<f64,>,
    pub avg_reviewers:           Option<f64,>,
    pub median_reviewers:        Option<f64,>,
    pub avg_loc_changed:         Option<f64,>,
    pub median_loc_changed:      Option<f64,>,
    pub avg_total_comments:      Option<f64,>,
    pub median_total_comments:   Option<f64,>,
    pub merged:                  usize,
    pub merged_with_approval:    usize,
    /// `merged_with_approval / merged`, `None` when nothing merged.
    pub approval_rate:           Option<f64,>,
    pub rows:                    Vec<ReviewRow,>,
    pub largest:                 Vec<ReviewRow,>,
    pub slowest_review:          Vec<ReviewRow,>,
}

fn mean_and_median(mut values: Vec<f64,>,) -> (Option<f64,>, Option<f64,>,)
{
    values.sort_by(f64::total_cmp,);
    (mean(&values,), percentile(&values, 50.0,),)
}

/// Computes review quality statistics.
pub fn pull_request_quality(pulls: &[PullRequest],) -> PullRequestQuality
{
    let rows: Vec<ReviewRow,> = pulls.iter().map(ReviewRow::from_pull_request,).collect();
    let ready: Vec<&ReviewRow,> = rows.iter().filter(|row| !row.is_draft,).collect();

    let (avg_turnaround_hours, median_turnaround_hours,) =
        mean_and_median(ready.iter().filter_map(|row| row.review_turnaround_hours,).collect(),);
    let (avg_reviewers, median_reviewers,) =
        mean_and_median(ready.iter().map(|row| row.reviewers as f64,).collect(),);
    let (avg_loc_changed, median_loc_changed,) =
        mean_and_median(ready.iter().map(|row| row.loc_changed as f64,).collect(),);
    let (avg_total_comments, median_total_comments,) =
        mean_and_median(ready.iter().map(|row| row.total_comments as f64,).collect(),);

    let merged = ready.iter().filter(|row| row.merged_at.is_some(),).count();
    let merged_with_approval =
        ready.iter().filter(|row| row.merged_at.is_some() && row.approvals >= 1,).count();

    let mut largest: Vec<ReviewRow,> = ready.iter().map(|row| (*row).clone(),).collect();
    largest.sort_by(|a, b| b.loc_changed.cmp(&a.loc_changed,),);
    largest.truncate(TOP_PULL_REQUESTS,);

    let mut slowest_review: Vec<ReviewRow,> =
        ready.iter().filter(|row| row.review_turnaround_hours.is_some(),).map(|row| (*row).clone(),).collect();
    slowest_review.sort_by(|a, b| {
        b.review_turnaround_hours.unwrap_or(0.0,).total_cmp(&a.review_turnaround_hours.unwrap_or(0.0,),)
    },);
    slowest_review.truncate(TOP_PULL_REQUESTS,);

    PullRequestQuality {
        pull_requests: rows.len(),
        non_draft: ready.len(),
        avg_turnaround_hours,
        median_turnaround_hours,
        avg_reviewers,
        median_reviewers,
        avg_loc_changed,
        median_loc_changed,
        avg_total_comments,
        median_total_comments,
        merged,
        merged_with_approval,
        approval_rate: (merged > 0).then(|| merged_with_approval as f64 / merged as f64,),
        largest,
        slowest_review,
        rows,
    }
}
