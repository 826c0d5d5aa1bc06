// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

use chrono::{DateTime, SecondsFormat, Utc};
use futures::{StreamExt, stream};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{Account, login};
use crate::{
    client::{GitHubClient, Transport},
    error::Error,
    models::{Commit, CommitDetail, FileChange},
    paginate::PageBounds,
    repository::RepositoryId,
    time::parse_optional,
};

#[derive(Debug, Deserialize,)]
struct CommitPayload
{
    sha:    String,
    author: Option<Account,>,
    commit: Option<CommitBody,>,
    stats:  Option<StatsPayload,>,
    #[serde(default)]
    files:  Vec<FilePayload,>,
}

#[derive(Debug, Deserialize,)]
struct CommitBody
{
    author:       Option<Signature,>,
    verification: Option<Verification,>,
}

#[derive(Debug, Deserialize,)]
struct Signature
{
    email: Option<String,>,
    date:  Option<String,>,
}

#[derive(Debug, Deserialize,)]
struct Verification
{
    #[serde(default)]
    verified: bool,
}

#[derive(Debug, Default, Deserialize,)]
struct StatsPayload
{
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
}

#[derive(Debug, Deserialize,)]
struct FilePayload
{
    filename:  String,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
}

struct Header
{
    author:    String,
    timestamp: Option<DateTime<Utc,>,>,
    verified:  bool,
}

impl CommitPayload
{
    /// Author key and commit metadata, or `None` when neither a login nor an
    /// e-mail address is present.
    fn header(&mut self,) -> Option<Header,>
    {
        let body = self.commit.take();
        let (signature, verification,) = match body {
            Some(body,) => (body.author, body.verification,),
            None => (None, None,),
        };
        let email = signature.as_ref().and_then(|s| s.email.clone(),).filter(|e| !e.is_empty(),);
        let author = login(self.author.take(),).or(email,)?;

        Some(Header {
            author,
            timestamp: parse_optional(signature.as_ref().and_then(|s| s.date.as_deref(),),),
            verified: verification.is_some_and(|v| v.verified,),
        },)
    }
}

/// Lists commits on the default branch, optionally since an instant.
///
/// Commits without any author identity are skipped with a warning.
///
/// # Errors
///
/// Propagates request errors.
pub async fn fetch_commits<T: Transport,>(
    client: &GitHubClient<T,>,
    repo: &RepositoryId,
    since: Option<DateTime<Utc,>,>,
    bounds: PageBounds,
) -> Result<Vec<Commit,>, Error,>
{
    let mut query = Vec::new();
    if let Some(since,) = since {
        query.push(("since", since.to_rfc3339_opts(SecondsFormat::Secs, true,),),);
    }

    let payloads: Vec<CommitPayload,> =
        client.rest_paginate(&format!("{}/commits", repo.api_path()), &query, bounds,).await?;

    let commits: Vec<Commit,> = payloads
        .into_iter()
        .filter_map(|mut payload| match payload.header() {
            Some(header,) => Some(Commit {
                sha:       payload.sha,
                author:    header.author,
                timestamp: header.timestamp,
                verified:  header.verified,
            },),
            None => {
                warn!("skipping commit {} without author identity", payload.sha);
                None
            }
        },)
        .collect();

    debug!("fetched {} commits for {}", commits.len(), repo);
    Ok(commits,)
}

/// Fetches a single commit with per-file statistics.
///
/// # Errors
///
/// Propagates request errors and returns [`Error::Validation`] when the
/// commit carries no author identity.
pub async fn fetch_commit_detail<T: Transport,>(
    client: &GitHubClient<T,>,
    repo: &RepositoryId,
    sha: &str,
) -> Result<CommitDetail, Error,>
{
    let mut payload: CommitPayload =
        client.rest_get_as(&format!("{}/commits/{sha}", repo.api_path()), &[],).await?;
    let header = payload
        .header()
        .ok_or_else(|| Error::validation(format!("commit {sha} has no author identity"),),)?;
    let stats = payload.stats.unwrap_or_default();

    Ok(CommitDetail {
        sha:       payload.sha,
        author:    header.author,
        timestamp: header.timestamp,
        additions: stats.additions,
        deletions: stats.deletions,
        verified:  header.verified,
        files:     payload
            .files
            .into_iter()
            .map(|file| FileChange {
                path:      file.filename,
                additions: file.additions,
                deletions: file.deletions,
            },)
            .collect(),
    },)
}

/// Fetches commit details with at most `workers` requests in flight.
///
/// Results arrive in completion order. A failed fetch is logged and skipped,
/// so the returned list may be shorter than `commits`.
pub async fn fetch_commit_details<T: Transport,>(
    client: &GitHubClient<T,>,
    repo: &RepositoryId,
    commits: &[Commit],
    workers: usize,
) -> Vec<CommitDetail,>
{
    let progress = ProgressBar::new(commits.len() as u64,);
    if let Ok(style,) =
        ProgressStyle::default_bar().template("{spinner:.yellow} [{elapsed_precise}] {bar:30} {pos}/{len} {msg}",)
    {
        progress.set_style(style,);
    }
    progress.set_message("fetching commit details",);

    let mut pending = stream::iter(commits,)
        .map(|commit| async move {
            (commit.sha.as_str(), fetch_commit_detail(client, repo, &commit.sha,).await,)
        },)
        .buffer_unordered(workers.max(1,),);

    let mut details = Vec::with_capacity(commits.len(),);
    let mut failed = 0usize;
    while let Some((sha, result,),) = pending.next().await {
        progress.inc(1,);
        match result {
            Ok(detail,) => details.push(detail,),
            Err(e,) => {
                failed += 1;
                warn!("skipping details for commit {}: {}", sha, e);
            }
        }
    }

    progress.finish_and_clear();
    info!("fetched details for {} of {} commits ({} failed)", details.len(), commits.len(), failed);
    details
}
