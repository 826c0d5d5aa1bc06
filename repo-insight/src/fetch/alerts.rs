// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    client::{GitHubClient, Transport},
    models::SecurityAlert,
    paginate::PageBounds,
    repository::RepositoryId,
    time::parse_optional,
};

#[derive(Debug, Deserialize,)]
struct AlertPayload
{
    #[serde(default)]
    number:                 u64,
    #[serde(default)]
    state:                  String,
    created_at:             Option<String,>,
    fixed_at:               Option<String,>,
    security_advisory:      Option<AdvisoryPayload,>,
    security_vulnerability: Option<VulnerabilityPayload,>,
    dependency:             Option<DependencyPayload,>,
}

#[derive(Debug, Deserialize,)]
struct AdvisoryPayload
{
    severity: Option<String,>,
}

#[derive(Debug, Deserialize,)]
struct VulnerabilityPayload
{
    severity: Option<String,>,
    package:  Option<PackagePayload,>,
}

#[derive(Debug, Deserialize,)]
struct DependencyPayload
{
    package: Option<PackagePayload,>,
}

#[derive(Debug, Deserialize,)]
struct PackagePayload
{
    name: Option<String,>,
}

impl From<AlertPayload,> for SecurityAlert
{
    fn from(payload: AlertPayload,) -> Self
    {
        let (vulnerability_severity, vulnerability_package,) = match payload.security_vulnerability {
            Some(v,) => (v.severity, v.package.and_then(|p| p.name,),),
            None => (None, None,),
        };
        let severity =
            vulnerability_severity.or_else(|| payload.security_advisory.and_then(|a| a.severity,),);
        let package = payload
            .dependency
            .and_then(|d| d.package,)
            .and_then(|p| p.name,)
            .or(vulnerability_package,);

        Self {
            number: payload.number,
            state: payload.state,
            severity,
            package,
            created_at: parse_optional(payload.created_at.as_deref(),),
            fixed_at: parse_optional(payload.fixed_at.as_deref(),),
        }
    }
}

/// Reads Dependabot alerts in every state, page by page.
///
/// Alerts are frequently unavailable (disabled feature, missing scope); any
/// failure is logged and yields an empty list.
pub async fn fetch_dependabot_alerts<T: Transport,>(
    client: &GitHubClient<T,>,
    repo: &RepositoryId,
    bounds: PageBounds,
) -> Vec<SecurityAlert,>
{
    let path = format!("{}/dependabot/alerts", repo.api_path());
    match client.rest_paginate::<AlertPayload,>(&path, &[], bounds,).await {
        Ok(payloads,) => {
            debug!("fetched {} Dependabot alerts for {}", payloads.len(), repo);
            payloads.into_iter().map(SecurityAlert::from,).collect()
        }
        Err(e,) => {
            warn!("Dependabot alerts not accessible for {}: {}", repo, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::{
        client::fake::{FakeTransport, ok, status},
        retry::RetryConfig,
    };

    fn repo() -> RepositoryId
    {
        RepositoryId::parse("o/r",).expect("valid repository",)
    }

    #[tokio::test]
    async fn alerts_are_normalized()
    {
        let body = r#"[{"number":4,"state":"fixed","created_at":"2024-01-01T00:00:00Z",
            "fixed_at":"2024-01-03T00:00:00Z",
            "security_advisory":{"severity":"high"},
            "dependency":{"package":{"name":"serde"}}}]"#;
        let transport = FakeTransport::default().route(
            "/repos/o/r/dependabot/alerts",
            vec![Ok(ok(body,),), Ok(ok("[]",),)],
            None,
        );
        let client = GitHubClient::new(transport, RetryConfig::default(),);

        let alerts = fetch_dependabot_alerts(&client, &repo(), PageBounds::pages(100, 10,),).await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity.as_deref(), Some("high"));
        assert_eq!(alerts[0].package.as_deref(), Some("serde"));
        assert!(!alerts[0].is_open());
        assert!(alerts[0].fixed_at.is_some());
    }

    #[tokio::test]
    async fn inaccessible_alerts_yield_empty_list()
    {
        let transport = FakeTransport::default().route(
            "/repos/o/r/dependabot/alerts",
            Vec::new(),
            Some(status(403, r#"{"message":"Resource not accessible by integration"}"#,),),
        );
        let client = GitHubClient::new(transport, RetryConfig::default(),);
        assert!(fetch_dependabot_alerts(&client, &repo(), PageBounds::pages(100, 10,),).await.is_empty());
    }

    #[tokio::test]
    async fn alerts_span_several_pages()
    {
        let alert = |number: u32| format!(r#"{{"number":{number},"state":"open"}}"#);
        let first = format!("[{}]", (1..=30).map(alert,).collect::<Vec<_,>>().join(","));
        let second = format!("[{}]", alert(31,));
        let transport = FakeTransport::default().route(
            "/repos/o/r/dependabot/alerts",
            vec![Ok(ok(&first,),), Ok(ok(&second,),), Ok(ok("[]",),)],
            None,
        );
        let client = GitHubClient::new(transport, RetryConfig::default(),);

        let alerts = fetch_dependabot_alerts(&client, &repo(), PageBounds::pages(30, 10,),).await;
        assert_eq!(alerts.len(), 31);
        assert_eq!(alerts[30].number, 31);

        let paths: Vec<String,> = client.transport().requests().into_iter().map(|request| request.path,).collect();
        assert_eq!(paths, vec![
            "/repos/o/r/dependabot/alerts?per_page=30&page=1".to_owned(),
            "/repos/o/r/dependabot/alerts?per_page=30&page=2".to_owned(),
            "/repos/o/r/dependabot/alerts?per_page=30&page=3".to_owned(),
        ]);
    }
}
