// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

use serde::{Deserialize, de::IgnoredAny};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::{
    client::{GitHubClient, Transport},
    error::Error,
    models::RepositoryMetadata,
    paginate::{Connection, PageBounds, collect_cursor_pages},
    repository::RepositoryId,
    time::parse_optional,
};

const HISTORY_QUERY: &str = r#"
query ($owner: String!, $name: String!, $first: Int!, $cursor: String) {
  repository(owner: $owner, name: $name) {
    defaultBranchRef {
      target {
        ... on Commit {
          history(first: $first, after: $cursor) {
            nodes { oid }
            pageInfo { hasNextPage endCursor }
          }
        }
      }
    }
  }
}
"#;

#[derive(Debug, Deserialize,)]
struct RepositoryPayload
{
    full_name:         Option<String,>,
    description:       Option<String,>,
    language:          Option<String,>,
    #[serde(default)]
    stargazers_count:  u64,
    #[serde(default)]
    forks_count:       u64,
    #[serde(default)]
    open_issues_count: u64,
    license:           Option<LicensePayload,>,
    default_branch:    Option<String,>,
    visibility:        Option<String,>,
    #[serde(default)]
    archived:          bool,
    created_at:        Option<String,>,
    updated_at:        Option<String,>,
}

#[derive(Debug, Deserialize,)]
struct LicensePayload
{
    name: Option<String,>,
}

#[derive(Debug, Deserialize,)]
struct RateLimitPayload
{
    rate: Option<RatePayload,>,
}

#[derive(Debug, Deserialize,)]
struct RatePayload
{
    remaining: Option<u64,>,
}

/// Remaining core REST quota for the authenticated token.
///
/// # Errors
///
/// Propagates request errors.
pub async fn fetch_rate_limit_remaining<T: Transport,>(client: &GitHubClient<T,>,) -> Result<Option<u64,>, Error,>
{
    let payload: RateLimitPayload = client.rest_get_as("/rate_limit", &[],).await?;
    Ok(payload.rate.and_then(|rate| rate.remaining,),)
}

/// Repository facts and remaining quota.
///
/// A failed quota lookup is logged and reported as unknown.
///
/// # Errors
///
/// Propagates errors from the repository lookup, including `404` for a
/// repository that does not exist or is not visible to the token.
pub async fn fetch_repository_metadata<T: Transport,>(
    client: &GitHubClient<T,>,
    repo: &RepositoryId,
) -> Result<RepositoryMetadata, Error,>
{
    let payload: RepositoryPayload = client.rest_get_as(&repo.api_path(), &[],).await?;
    let rate_limit_remaining = match fetch_rate_limit_remaining(client,).await {
        Ok(remaining,) => remaining,
        Err(e,) => {
            warn!("could not read rate limit: {}", e);
            None
        }
    };

    Ok(RepositoryMetadata {
        full_name: payload.full_name.unwrap_or_else(|| repo.to_string(),),
        description: payload.description.filter(|text| !text.trim().is_empty(),),
        language: payload.language,
        stars: payload.stargazers_count,
        forks: payload.forks_count,
        open_issues: payload.open_issues_count,
        license: payload.license.and_then(|license| license.name,),
        default_branch: payload.default_branch,
        visibility: payload.visibility,
        archived: payload.archived,
        created_at: parse_optional(payload.created_at.as_deref(),),
        updated_at: parse_optional(payload.updated_at.as_deref(),),
        rate_limit_remaining,
    },)
}

/// Counts commits reachable from the default branch by walking its history.
///
/// An empty repository has no default branch and counts zero. The walk stops
/// at `bounds.max_pages`, in which case the count is a lower bound.
///
/// # Errors
///
/// Propagates request and GraphQL errors.
pub async fn fetch_total_commits<T: Transport,>(
    client: &GitHubClient<T,>,
    repo: &RepositoryId,
    bounds: PageBounds,
) -> Result<u64, Error,>
{
    let first = bounds.per_page.min(100,);
    let oids: Vec<IgnoredAny,> = collect_cursor_pages(bounds, |cursor| async move {
        let variables = json!({ "owner": repo.owner, "name": repo.name, "first": first, "cursor": cursor });
        let mut data = client.graphql(HISTORY_QUERY, variables,).await?;
        match data.pointer_mut("/repository/defaultBranchRef/target/history",).map(Value::take,) {
            Some(history,) if !history.is_null() => Connection::from_value(history,),
            _ => Ok(Connection {
                nodes: Vec::new(), has_next_page: false, end_cursor: None,
            },),
        }
    },)
    .await?;

    debug!("default branch of {} holds {} commits", repo, oids.len());
    Ok(oids.len() as u64,)
}
