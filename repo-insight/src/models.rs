// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Typed records produced by the fetchers and consumed by the metric
//! calculators.
//!
//! Every timestamp is optional: a record whose timestamp is missing or
//! unparseable is kept, but it is left out of any time-based aggregate.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Start and completion instants of a record that has a lead time.
pub trait Interval
{
    /// Instant the record was opened.
    fn started_at(&self,) -> Option<DateTime<Utc,>,>;

    /// Instant the record was completed (merged, closed, fixed).
    fn completed_at(&self,) -> Option<DateTime<Utc,>,>;
}

/// Commit from the repository history listing.
#[derive(Debug, Clone, PartialEq, Serialize,)]
pub struct Commit
{
    pub sha:       String,
    /// Login, falling back to the commit e-mail address.
    pub author:    String,
    pub timestamp: Option<DateTime<Utc,>,>,
    pub verified:  bool,
}

/// Lines changed in a single file by one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize,)]
pub struct FileChange
{
    pub path:      String,
    pub additions: u64,
    pub deletions: u64,
}

impl FileChange
{
    /// Added plus deleted lines.
    pub fn churn(&self,) -> u64
    {
        self.additions + self.deletions
    }
}

/// Commit enriched with per-file statistics.
#[derive(Debug, Clone, PartialEq, Serialize,)]
pub struct CommitDetail
{
    pub sha:       String,
    pub author:    String,
    pub timestamp: Option<DateTime<Utc,>,>,
    pub additions: u64,
    pub deletions: u64,
    pub verified:  bool,
    pub files:     Vec<FileChange,>,
}

/// Submitted pull request review.
#[derive(Debug, Clone, PartialEq, Serialize,)]
pub struct Review
{
    pub author:       Option<String,>,
    /// GraphQL review state such as `APPROVED` or `COMMENTED`.
    pub state:        String,
    pub submitted_at: Option<DateTime<Utc,>,>,
}

impl Review
{
    pub fn is_approval(&self,) -> bool
    {
        self.state.eq_ignore_ascii_case("APPROVED",)
    }
}

/// Pull request with whichever fields the originating query selected.
#[derive(Debug, Clone, Default, PartialEq, Serialize,)]
pub struct PullRequest
{
    pub number:         u64,
    pub title:          String,
    pub url:            String,
    pub author:         Option<String,>,
    pub is_draft:       bool,
    pub created_at:     Option<DateTime<Utc,>,>,
    pub updated_at:     Option<DateTime<Utc,>,>,
    pub merged_at:      Option<DateTime<Utc,>,>,
    pub closed_at:      Option<DateTime<Utc,>,>,
    pub additions:      u64,
    pub deletions:      u64,
    pub changed_files:  u64,
    pub base_ref:       String,
    pub head_ref:       String,
    pub reviews:        Vec<Review,>,
    pub issue_comments: u64,
    pub review_threads: u64,
    /// Instants of `ReopenedEvent` timeline items.
    pub reopened_at:    Vec<DateTime<Utc,>,>,
}

impl Interval for PullRequest
{
    fn started_at(&self,) -> Option<DateTime<Utc,>,>
    {
        self.created_at
    }

    fn completed_at(&self,) -> Option<DateTime<Utc,>,>
    {
        self.merged_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize,)]
#[serde(rename_all = "lowercase")]
pub enum IssueState
{
    Open,
    Closed,
}

/// Issue, excluding pull requests.
#[derive(Debug, Clone, PartialEq, Serialize,)]
pub struct Issue
{
    pub number:     u64,
    pub title:      String,
    pub state:      IssueState,
    pub author:     Option<String,>,
    pub created_at: Option<DateTime<Utc,>,>,
    pub closed_at:  Option<DateTime<Utc,>,>,
    pub labels:     Vec<String,>,
    pub comments:   u64,
}

impl Interval for Issue
{
    fn started_at(&self,) -> Option<DateTime<Utc,>,>
    {
        self.created_at
    }

    fn completed_at(&self,) -> Option<DateTime<Utc,>,>
    {
        self.closed_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize,)]
pub struct Branch
{
    pub name:      String,
    pub protected: bool,
    pub head_sha:  Option<String,>,
}

/// Dependabot alert.
#[derive(Debug, Clone, PartialEq, Serialize,)]
pub struct SecurityAlert
{
    pub number:     u64,
    /// `open`, `fixed`, `dismissed`, or `auto_dismissed`.
    pub state:      String,
    pub severity:   Option<String,>,
    pub package:    Option<String,>,
    pub created_at: Option<DateTime<Utc,>,>,
    pub fixed_at:   Option<DateTime<Utc,>,>,
}

impl SecurityAlert
{
    pub fn is_open(&self,) -> bool
    {
        self.state.eq_ignore_ascii_case("open",)
    }
}

impl Interval for SecurityAlert
{
    fn started_at(&self,) -> Option<DateTime<Utc,>,>
    {
        self.created_at
    }

    fn completed_at(&self,) -> Option<DateTime<Utc,>,>
    {
        self.fixed_at
    }
}

/// Repository facts for the startup banner and the PDF overview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize,)]
pub struct RepositoryMetadata
{
    pub full_name:            String,
    pub description:          Option<String,>,
    pub language:             Option<String,>,
    pub stars:                u64,
    pub forks:                u64,
    /// Open issues and pull requests, as counted by GitHub.
    pub open_issues:          u64,
    pub license:              Option<String,>,
    pub default_branch:       Option<String,>,
    pub visibility:           Option<String,>,
    pub archived:             bool,
    pub created_at:           Option<DateTime<Utc,>,>,
    pub updated_at:           Option<DateTime<Utc,>,>,
    pub rate_limit_remaining: Option<u64,>,
}
