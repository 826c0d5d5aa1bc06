// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{Account, login};
use crate::{
    client::{GitHubClient, Transport},
    error::Error,
    models::{Issue, IssueState},
    paginate::{PageBounds, collect_pages, decode_items},
    repository::RepositoryId,
    time::parse_optional,
};

#[derive(Debug, Deserialize,)]
struct IssuePayload
{
    number:       u64,
    #[serde(default)]
    title:        String,
    state:        Option<String,>,
    user:         Option<Account,>,
    created_at:   Option<String,>,
    closed_at:    Option<String,>,
    #[serde(default)]
    labels:       Vec<LabelPayload,>,
    #[serde(default)]
    comments:     u64,
    pull_request: Option<Value,>,
}

#[derive(Debug, Deserialize,)]
#[serde(untagged)]
enum LabelPayload
{
    Named
    {
        name: String
    },
    Plain(String,),
}

impl LabelPayload
{
    fn into_name(self,) -> String
    {
        match self {
            Self::Named {
                name,
            } => name,
            Self::Plain(name,) => name,
        }
    }
}

impl IssuePayload
{
    fn into_issue(self,) -> Option<Issue,>
    {
        let state = match self.state.as_deref() {
            Some("open",) => IssueState::Open,
            Some("closed",) => IssueState::Closed,
            other => {
                warn!("skipping issue #{} with unknown state {:?}", self.number, other);
                return None;
            }
        };

        Some(Issue {
            number: self.number,
            title: self.title,
            state,
            author: login(self.user,),
            created_at: parse_optional(self.created_at.as_deref(),),
            closed_at: parse_optional(self.closed_at.as_deref(),),
            labels: self.labels.into_iter().map(LabelPayload::into_name,).collect(),
            comments: self.comments,
        },)
    }
}

/// Lists open and closed issues, excluding pull requests.
///
/// The issues endpoint rejects deep page numbers with `422 Unprocessable
/// Entity`; that status ends the walk with a warning and keeps the issues
/// collected so far.
///
/// # Errors
///
/// Propagates any other request error.
pub async fn fetch_issues<T: Transport,>(
    client: &GitHubClient<T,>,
    repo: &RepositoryId,
    bounds: PageBounds,
) -> Result<Vec<Issue,>, Error,>
{
    let path = format!("{}/issues", repo.api_path());
    let path = path.as_str();

    let raw = collect_pages(bounds, |page| async move {
        let query = [
            ("state", "all".to_owned(),),
            ("per_page", bounds.per_page.to_string(),),
            ("page", page.to_string(),),
        ];
        match client.rest_get(path, &query,).await {
            Ok(Value::Array(items,),) => Ok(items,),
            Ok(_,) => Ok(Vec::new(),),
            Err(e,) if e.status() == Some(422,) => {
                warn!("stopping issue fetch at page {}: {}", page, e);
                Ok(Vec::new(),)
            }
            Err(e,) => Err(e,),
        }
    },)
    .await?;

    let payloads: Vec<IssuePayload,> = decode_items(raw,);
    let total = payloads.len();
    let issues: Vec<Issue,> = payloads
        .into_iter()
        .filter(|payload| payload.pull_request.is_none(),)
        .filter_map(IssuePayload::into_issue,)
        .collect();

    debug!("kept {} issues out of {} records for {}", issues.len(), total, repo);
    Ok(issues,)
}
