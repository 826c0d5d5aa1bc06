// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Pull request searches over the GraphQL API.
//!
//! The REST pulls endpoint cannot filter by merge or close date, so every
//! pull request query here goes through `search(type: ISSUE)` with a
//! `repo:`/`is:pr` qualifier and a date bound.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{Account, login};
use crate::{
    client::{GitHubClient, Transport},
    error::Error,
    models::{PullRequest, Review},
    paginate::PageBounds,
    repository::RepositoryId,
    time::parse_optional,
};

const COUNT_QUERY: &str = r#"
query ($q: String!) {
  search(query: $q, type: ISSUE, first: 1) {
    issueCount
  }
}
"#;

const MERGED_QUERY: &str = r#"
query ($q: String!, $cursor: String) {
  search(query: $q, type: ISSUE, first: 100, after: $cursor) {
    nodes {
      ... on PullRequest {
        number
        title
        url
        createdAt
        mergedAt
        baseRefName
        headRefName
        author { login }
      }
    }
    pageInfo { hasNextPage endCursor }
  }
}
"#;

const CLOSED_UNMERGED_QUERY: &str = r#"
query ($q: String!, $cursor: String) {
  search(query: $q, type: ISSUE, first: 100, after: $cursor) {
    nodes {
      ... on PullRequest {
        number
        title
        url
        createdAt
        closedAt
        mergedAt
        author { login }
      }
    }
    pageInfo { hasNextPage endCursor }
  }
}
"#;

const REVIEW_QUERY: &str = r#"
query ($q: String!, $cursor: String) {
  search(query: $q, type: ISSUE, first: 50, after: $cursor) {
    nodes {
      ... on PullRequest {
        number
        title
        url
        isDraft
        createdAt
        updatedAt
        closedAt
        mergedAt
        additions
        deletions
        changedFiles
        author { login }
        comments { totalCount }
        reviewThreads { totalCount }
        reviews(first: 50) {
          nodes {
            author { login }
            state
            submittedAt
          }
        }
      }
    }
    pageInfo { hasNextPage endCursor }
  }
}
"#;

const REOPEN_QUERY: &str = r#"
query ($q: String!, $cursor: String) {
  search(query: $q, type: ISSUE, first: 50, after: $cursor) {
    nodes {
      ... on PullRequest {
        number
        title
        url
        updatedAt
        closedAt
        author { login }
        timelineItems(itemTypes: REOPENED_EVENT, first: 50) {
          nodes {
            ... on ReopenedEvent { createdAt }
          }
        }
      }
    }
    pageInfo { hasNextPage endCursor }
  }
}
"#;

/// Search filters used for pull request counts and listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub enum PullRequestSearch
{
    /// Closed since the given date, merged or not.
    Closed,
    /// Merged since the given date.
    Merged,
    /// Closed without merging since the given date.
    ClosedUnmerged,
    /// Created since the given date.
    Created,
    /// Updated since the given date.
    Updated,
}

impl PullRequestSearch
{
    /// Builds the search string for `repo` bounded by the date of `since`.
    ///
    /// ```
    /// use repo_insight::{RepositoryId, fetch::PullRequestSearch};
    ///
    /// let repo = RepositoryId::parse("o/r",)?;
    /// let since = repo_insight::time::parse_timestamp("2024-05-01T12:00:00Z",).unwrap();
    /// assert_eq!(
    ///     PullRequestSearch::Merged.query(&repo, since,),
    ///     "repo:o/r is:pr is:merged merged:>=2024-05-01 sort:updated-desc"
    /// );
    /// # Ok::<(), repo_insight::Error>(())
    /// ```
    pub fn query(self, repo: &RepositoryId, since: DateTime<Utc,>,) -> String
    {
        let date = since.format("%Y-%m-%d",);
        let filter = match self {
            Self::Closed => format!("is:closed closed:>={date}"),
            Self::Merged => format!("is:merged merged:>={date}"),
            Self::ClosedUnmerged => format!("is:closed -is:merged closed:>={date}"),
            Self::Created => format!("created:>={date} sort:created-desc"),
            Self::Updated => format!("updated:>={date}"),
        };
        let sort = if matches!(self, Self::Created) { "" } else { " sort:updated-desc" };
        format!("{} is:pr {filter}{sort}", repo.search_qualifier())
    }
}

#[derive(Debug, Deserialize,)]
struct CountData
{
    search: Option<CountPayload,>,
}

#[derive(Debug, Deserialize,)]
#[serde(rename_all = "camelCase")]
struct CountPayload
{
    issue_count: Option<u64,>,
}

#[derive(Debug, Deserialize,)]
#[serde(rename_all = "camelCase")]
struct PullRequestNode
{
    number:         Option<u64,>,
    title:          Option<String,>,
    url:            Option<String,>,
    is_draft:       Option<bool,>,
    created_at:     Option<String,>,
    updated_at:     Option<String,>,
    merged_at:      Option<String,>,
    closed_at:      Option<String,>,
    additions:      Option<u64,>,
    deletions:      Option<u64,>,
    changed_files:  Option<u64,>,
    base_ref_name:  Option<String,>,
    head_ref_name:  Option<String,>,
    author:         Option<Account,>,
    comments:       Option<TotalCount,>,
    review_threads: Option<TotalCount,>,
    reviews:        Option<Nodes<ReviewNode,>,>,
    timeline_items: Option<Nodes<EventNode,>,>,
}

#[derive(Debug, Deserialize,)]
#[serde(rename_all = "camelCase")]
struct TotalCount
{
    total_count: Option<u64,>,
}

#[derive(Debug, Deserialize,)]
struct Nodes<N,>
{
    nodes: Option<Vec<Option<N,>,>,>,
}

#[derive(Debug, Deserialize,)]
#[serde(rename_all = "camelCase")]
struct ReviewNode
{
    author:       Option<Account,>,
    state:        Option<String,>,
    submitted_at: Option<String,>,
}

#[derive(Debug, Deserialize,)]
#[serde(rename_all = "camelCase")]
struct EventNode
{
    created_at: Option<String,>,
}

fn total(count: Option<TotalCount,>,) -> u64
{
    count.and_then(|c| c.total_count,).unwrap_or(0,)
}

impl PullRequestNode
{
    /// Converts a search node; `None` for nodes that are not pull requests.
    fn into_pull_request(self,) -> Option<PullRequest,>
    {
        let number = self.number?;

        let reviews = self
            .reviews
            .and_then(|connection| connection.nodes,)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .map(|review| Review {
                author:       login(review.author,),
                state:        review.state.unwrap_or_default(),
                submitted_at: parse_optional(review.submitted_at.as_deref(),),
            },)
            .collect();

        let reopened_at = self
            .timeline_items
            .and_then(|connection| connection.nodes,)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .filter_map(|event| parse_optional(event.created_at.as_deref(),),)
            .collect();

        Some(PullRequest {
            number,
            title: self.title.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            author: login(self.author,),
            is_draft: self.is_draft.unwrap_or(false,),
            created_at: parse_optional(self.created_at.as_deref(),),
            updated_at: parse_optional(self.updated_at.as_deref(),),
            merged_at: parse_optional(self.merged_at.as_deref(),),
            closed_at: parse_optional(self.closed_at.as_deref(),),
            additions: self.additions.unwrap_or(0,),
            deletions: self.deletions.unwrap_or(0,),
            changed_files: self.changed_files.unwrap_or(0,),
            base_ref: self.base_ref_name.unwrap_or_default(),
            head_ref: self.head_ref_name.unwrap_or_default(),
            reviews,
            issue_comments: total(self.comments,),
            review_threads: total(self.review_threads,),
            reopened_at,
        },)
    }
}

async fn search<T: Transport,>(
    client: &GitHubClient<T,>,
    query: &str,
    search: &str,
    bounds: PageBounds,
) -> Result<Vec<PullRequest,>, Error,>
{
    let nodes: Vec<PullRequestNode,> = client.search_paginate(query, search, bounds,).await?;
    let pulls: Vec<PullRequest,> =
        nodes.into_iter().filter_map(PullRequestNode::into_pull_request,).collect();
    debug!("search '{}' returned {} pull requests", search, pulls.len());
    Ok(pulls,)
}

/// Number of pull requests matching a search, via `issueCount`.
///
/// # Errors
///
/// Propagates request and GraphQL errors.
pub async fn count_pull_requests<T: Transport,>(
    client: &GitHubClient<T,>,
    repo: &RepositoryId,
    kind: PullRequestSearch,
    since: DateTime<Utc,>,
) -> Result<u64, Error,>
{
    let data = client.graphql(COUNT_QUERY, json!({ "q": kind.query(repo, since) }),).await?;
    let data: CountData = serde_json::from_value(data,)?;
    Ok(data.search.and_then(|s| s.issue_count,).unwrap_or(0,),)
}

/// Pull requests merged at or after `since`.
///
/// Search matches by merge date only; nodes whose parsed `mergedAt` or
/// `createdAt` is missing or precedes `since` are dropped.
///
/// # Errors
///
/// Propagates request and GraphQL errors.
pub async fn fetch_merged_pull_requests<T: Transport,>(
    client: &GitHubClient<T,>,
    repo: &RepositoryId,
    since: DateTime<Utc,>,
    bounds: PageBounds,
) -> Result<Vec<PullRequest,>, Error,>
{
    let pulls = search(client, MERGED_QUERY, &PullRequestSearch::Merged.query(repo, since,), bounds,).await?;
    Ok(pulls
        .into_iter()
        .filter(|pull| {
            let keep = pull.created_at.is_some() && pull.merged_at.is_some_and(|merged| merged >= since,);
            if !keep {
                warn!("skipping pull request #{} outside the merge window", pull.number);
            }
            keep
        },)
        .collect(),)
}

/// Pull requests closed without merging at or after `since`.
///
/// # Errors
///
/// Propagates request and GraphQL errors.
pub async fn fetch_closed_unmerged_pull_requests<T: Transport,>(
    client: &GitHubClient<T,>,
    repo: &RepositoryId,
    since: DateTime<Utc,>,
    bounds: PageBounds,
) -> Result<Vec<PullRequest,>, Error,>
{
    search(client, CLOSED_UNMERGED_QUERY, &PullRequestSearch::ClosedUnmerged.query(repo, since,), bounds,)
        .await
}

/// Pull requests created at or after `since`, with reviews and comment counts.
///
/// # Errors
///
/// Propagates request and GraphQL errors.
pub async fn fetch_pull_requests_for_review<T: Transport,>(
    client: &GitHubClient<T,>,
    repo: &RepositoryId,
    since: DateTime<Utc,>,
    bounds: PageBounds,
) -> Result<Vec<PullRequest,>, Error,>
{
    search(client, REVIEW_QUERY, &PullRequestSearch::Created.query(repo, since,), bounds,).await
}

/// Pull requests updated at or after `since`, with their reopen events.
///
/// Search has no reopen qualifier; a reopen implies an update, so this set is
/// a superset of the pull requests reopened in the window.
///
/// # Errors
///
/// Propagates request and GraphQL errors.
pub async fn fetch_reopen_candidates<T: Transport,>(
    client: &GitHubClient<T,>,
    repo: &RepositoryId,
    since: DateTime<Utc,>,
    bounds: PageBounds,
) -> Result<Vec<PullRequest,>, Error,>
{
    search(client, REOPEN_QUERY, &PullRequestSearch::Updated.query(repo, since,), bounds,).await
}
