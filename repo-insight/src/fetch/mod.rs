// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Fetchers that turn GitHub REST and GraphQL payloads into the typed records
//! in [`crate::models`].
//!
//! Wire payloads are decoded into private structs whose fields are all
//! optional, then normalized. A record that lacks an identity field is
//! skipped with a warning instead of failing the whole collection.

mod alerts;
mod branches;
mod commits;
mod issues;
mod meta;
mod pulls;

use serde::Deserialize;

pub use alerts::fetch_dependabot_alerts;
pub use branches::fetch_branches;
pub use commits::{fetch_commit_detail, fetch_commit_details, fetch_commits};
pub use issues::fetch_issues;
pub use meta::{fetch_rate_limit_remaining, fetch_repository_metadata, fetch_total_commits};
pub use pulls::{
    PullRequestSearch, count_pull_requests, fetch_closed_unmerged_pull_requests,
    fetch_merged_pull_requests, fetch_pull_requests_for_review, fetch_reopen_candidates,
};

/// `{ "login": ... }` object shared by REST and GraphQL payloads.
#[derive(Debug, Default, Deserialize,)]
struct Account
{
    login: Option<String,>,
}

fn login(account: Option<Account,>,) -> Option<String,>
{
    account.and_then(|account| account.login,).filter(|login| !login.is_empty(),)
}
