// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

use serde::Deserialize;

use crate::{
    client::{GitHubClient, Transport},
    error::Error,
    models::Branch,
    paginate::PageBounds,
    repository::RepositoryId,
};

#[derive(Debug, Deserialize,)]
struct BranchPayload
{
    name:      String,
    #[serde(default)]
    protected: bool,
    commit:    Option<HeadPayload,>,
}

#[derive(Debug, Deserialize,)]
struct HeadPayload
{
    sha: Option<String,>,
}

/// Lists branches with their protection flag and head commit.
///
/// # Errors
///
/// Propagates request errors.
pub async fn fetch_branches<T: Transport,>(
    client: &GitHubClient<T,>,
    repo: &RepositoryId,
    bounds: PageBounds,
) -> Result<Vec<Branch,>, Error,>
{
    let payloads: Vec<BranchPayload,> =
        client.rest_paginate(&format!("{}/branches", repo.api_path()), &[], bounds,).await?;

    Ok(payloads
        .into_iter()
        .map(|payload| Branch {
            name:      payload.name,
            protected: payload.protected,
            head_sha:  payload.commit.and_then(|head| head.sha,),
        },)
        .collect(),)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::{
        client::fake::{FakeTransport, ok},
        retry::RetryConfig,
    };

    #[tokio::test]
    async fn branches_keep_protection_and_head()
    {
        let transport = FakeTransport::default().route(
            "/repos/o/r/branches",
            vec![Ok(ok(
                r#"[{"name":"main","protected":true,"commit":{"sha":"abc"}},{"name":"dev","commit":null}]"#,
            ),)],
            None,
        );
        let client = GitHubClient::new(transport, RetryConfig::default(),);
        let repo = RepositoryId::parse("o/r",).expect("valid repository",);

        let branches = fetch_branches(&client, &repo, PageBounds::pages(100, 5,),)
            .await
            .expect("branches fetched",);

        assert_eq!(branches, vec![
            Branch {
                name: "main".to_owned(), protected: true, head_sha: Some("abc".to_owned()),
            },
            Branch {
                name: "dev".to_owned(), protected: false, head_sha: None,
            },
        ]);
    }
}
