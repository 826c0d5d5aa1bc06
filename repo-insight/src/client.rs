// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

/// Authenticated GitHub REST and GraphQL client with retry.
///
/// Requests travel through a [`Transport`], which returns the raw status,
/// rate-limit headers, and body. [`GitHubClient`] turns those into decoded
/// JSON or classified [`Error`]s and drives the retry loop. The production
/// transport wraps an authenticated [`Octocrab`] instance.
use std::{future::Future, time::Duration};

use octocrab::Octocrab;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::{
    error::Error,
    retry::{AttemptError, RetryConfig, retry_with_backoff},
};

/// HTTP method used by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub enum Method
{
    /// REST reads.
    Get,
    /// GraphQL queries.
    Post,
}

/// Request handed to a [`Transport`].
#[derive(Debug, Clone, PartialEq,)]
pub struct ApiRequest
{
    /// HTTP method.
    pub method: Method,
    /// Path relative to the API root, including any query string.
    pub path:   String,
    /// JSON body for POST requests.
    pub body:   Option<Value,>,
}

/// Raw response returned by a [`Transport`].
#[derive(Debug, Clone, Default,)]
pub struct RawResponse
{
    /// HTTP status code.
    pub status:               u16,
    /// Response body as text.
    pub body:                 String,
    /// Delay requested through the `Retry-After` header.
    pub retry_after:          Option<Duration,>,
    /// Value of the `x-ratelimit-remaining` header.
    pub rate_limit_remaining: Option<u64,>,
}

/// Sends a single request without any retry or status interpretation.
///
/// Implementations return `Err` only for transport failures (connection
/// reset, timeout, TLS); every HTTP status is reported through
/// [`RawResponse::status`].
pub trait Transport: Send + Sync
{
    /// Performs the request.
    fn send(&self, request: &ApiRequest,)
    -> impl Future<Output = Result<RawResponse, Error,>,> + Send;
}

/// [`Transport`] backed by an authenticated [`Octocrab`] client.
#[derive(Debug, Clone,)]
pub struct OctocrabTransport
{
    octocrab: Octocrab,
}

impl OctocrabTransport
{
    /// Builds a transport authenticated with a personal access token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the base URL is invalid or the client
    /// cannot be constructed.
    pub fn new(token: &str, base_url: &str,) -> Result<Self, Error,>
    {
        let octocrab = Octocrab::builder()
            .personal_token(token,)
            .base_uri(base_url,)
            .map_err(|e| Error::config(format!("invalid API base URL '{base_url}': {e}"),),)?
            .build()
            .map_err(|e| Error::config(format!("failed to initialize GitHub client: {e}"),),)?;

        Ok(Self {
            octocrab,
        },)
    }
}

impl Transport for OctocrabTransport
{
    async fn send(&self, request: &ApiRequest,) -> Result<RawResponse, Error,>
    {
        let transport_error = |e: octocrab::Error| Error::Transport {
            endpoint: request.path.clone(),
            message:  e.to_string(),
        };

        let response = match request.method {
            Method::Get => self.octocrab._get(request.path.as_str(),).await,
            Method::Post => self.octocrab._post(request.path.as_str(), request.body.as_ref(),).await,
        }
        .map_err(transport_error,)?;

        let header = |name: &str| {
            response
                .headers()
                .get(name,)
                .and_then(|value| value.to_str().ok(),)
                .and_then(|value| value.trim().parse::<u64,>().ok(),)
        };
        let status = response.status().as_u16();
        let retry_after = header("retry-after",).map(Duration::from_secs,);
        let rate_limit_remaining = header("x-ratelimit-remaining",);

        let body = self.octocrab.body_to_string(response,).await.map_err(transport_error,)?;

        Ok(RawResponse {
            status,
            body,
            retry_after,
            rate_limit_remaining,
        },)
    }
}

/// GitHub API client with bounded retry.
#[derive(Debug, Clone,)]
pub struct GitHubClient<T = OctocrabTransport,>
{
    transport: T,
    retry:     RetryConfig,
}

impl<T: Transport,> GitHubClient<T,>
{
    /// Wraps a transport with the given retry policy.
    pub fn new(transport: T, retry: RetryConfig,) -> Self
    {
        Self {
            transport, retry,
        }
    }

    /// Underlying transport.
    pub fn transport(&self,) -> &T
    {
        &self.transport
    }

    /// Issues a REST GET and returns the decoded JSON body.
    ///
    /// `query` pairs are percent-encoded and appended to `path`.
    ///
    /// # Errors
    ///
    /// Propagates definitive HTTP errors immediately and transient ones once
    /// retries are exhausted.
    pub async fn rest_get(&self, path: &str, query: &[(&str, String,)],) -> Result<Value, Error,>
    {
        let request = ApiRequest {
            method: Method::Get,
            path:   with_query(path, query,),
            body:   None,
        };
        self.execute(&request,).await
    }

    /// Issues a REST GET and deserializes the body into `R`.
    ///
    /// # Errors
    ///
    /// Same as [`rest_get`](Self::rest_get), plus [`Error::Decode`] when the
    /// payload does not match `R`.
    pub async fn rest_get_as<R: DeserializeOwned,>(
        &self,
        path: &str,
        query: &[(&str, String,)],
    ) -> Result<R, Error,>
    {
        let value = self.rest_get(path, query,).await?;
        Ok(serde_json::from_value(value,)?,)
    }

    /// Runs a GraphQL query and returns its `data` member.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphQl`] when the payload carries a non-empty
    /// `errors` array, in addition to the errors of
    /// [`rest_get`](Self::rest_get).
    pub async fn graphql(&self, query: &str, variables: Value,) -> Result<Value, Error,>
    {
        let request = ApiRequest {
            method: Method::Post,
            path:   "/graphql".to_owned(),
            body:   Some(json!({ "query": query, "variables": variables }),),
        };
        let mut payload = self.execute(&request,).await?;

        if let Some(errors,) = payload.get("errors",)
            && errors.as_array().is_some_and(|list| !list.is_empty(),)
        {
            return Err(Error::GraphQl {
                message: errors.to_string(),
            },);
        }

        Ok(payload.get_mut("data",).map(Value::take,).unwrap_or(Value::Null,),)
    }

    async fn execute(&self, request: &ApiRequest,) -> Result<Value, Error,>
    {
        debug!("{:?} {}", request.method, request.path);
        retry_with_backoff(&self.retry, &request.path, || async move {
            let response = self.transport.send(request,).await?;
            interpret(&request.path, response,)
        },)
        .await
    }
}

/// Maps a raw response onto decoded JSON or a classified error.
fn interpret(endpoint: &str, response: RawResponse,) -> Result<Value, AttemptError,>
{
    if (200..300).contains(&response.status,) {
        if response.body.trim().is_empty() {
            return Ok(Value::Null,);
        }
        return serde_json::from_str(&response.body,)
            .map_err(|source| AttemptError::from(Error::from(source,),),);
    }

    let message = serde_json::from_str::<Value,>(&response.body,)
        .ok()
        .and_then(|value| value.get("message",).and_then(Value::as_str,).map(str::to_owned,),)
        .unwrap_or_else(|| response.body.chars().take(200,).collect(),);

    let rate_limited = response.status == 429
        || (response.status == 403
            && (response.rate_limit_remaining == Some(0,)
                || message.to_ascii_lowercase().contains("rate limit",)));

    Err(AttemptError {
        error:       Error::Http {
            status: response.status,
            endpoint: endpoint.to_owned(),
            message,
            rate_limited,
        },
        retry_after: response.retry_after,
    },)
}

/// Appends percent-encoded query pairs to `path`.
fn with_query(path: &str, query: &[(&str, String,)],) -> String
{
    if query.is_empty() {
        return path.to_owned();
    }

    let encoded: Vec<String,> = query
        .iter()
        .map(|(key, value,)| format!("{}={}", urlencoding::encode(key,), urlencoding::encode(value,)),)
        .collect();
    let separator = if path.contains('?',) { '&' } else { '?' };
    format!("{path}{separator}{}", encoded.join("&"))
}


#[cfg(test)]
mod tests
{
    use std::time::Duration;

    use serde_json::json;

    use super::{
        GitHubClient, Method, RawResponse,
        fake::{FakeTransport, ok, status},
        with_query,
    };
    use crate::{error::Error, retry::RetryConfig};

    fn fast_retry() -> RetryConfig
    {
        RetryConfig {
            max_attempts: 3, initial_delay_ms: 1, backoff_factor: 2.0, max_jitter_ms: 0,
        }
    }

    #[test]
    fn query_pairs_are_percent_encoded()
    {
        let path = with_query(
            "/repos/o/r/commits",
            &[("since", "2024-01-01T00:00:00+00:00".to_owned(),), ("page", "2".to_owned(),),],
        );
        assert_eq!(path, "/repos/o/r/commits?since=2024-01-01T00%3A00%3A00%2B00%3A00&page=2");
        assert_eq!(with_query("/rate_limit", &[],), "/rate_limit");
    }

    #[tokio::test]
    async fn rest_get_decodes_json()
    {
        let client = GitHubClient::new(
            FakeTransport::default().always("/repos/o/r", r#"{"full_name":"o/r"}"#,),
            fast_retry(),
        );
        let value = client.rest_get("/repos/o/r", &[],).await.expect("request succeeds",);
        assert_eq!(value["full_name"], "o/r");
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_success()
    {
        let transport = FakeTransport::default().route(
            "/repos/o/r",
            vec![Ok(status(502, "bad gateway",),), Ok(status(503, "unavailable",),),],
            Some(ok("{\"ok\":true}",),),
        );
        let client = GitHubClient::new(transport, fast_retry(),);

        let value = client.rest_get("/repos/o/r", &[],).await.expect("third attempt succeeds",);
        assert_eq!(value["ok"], true);
        assert_eq!(client.transport.count("/repos/o/r"), 3);
    }

    #[tokio::test]
    async fn not_found_propagates_without_retry()
    {
        let client = GitHubClient::new(FakeTransport::default(), fast_retry(),);
        let error = client.rest_get("/repos/o/missing", &[],).await.expect_err("404 propagates",);

        assert_eq!(error.status(), Some(404));
        assert!(error.to_string().contains("Not Found"));
        assert_eq!(client.transport.count("/repos/o/missing"), 1);
    }

    #[tokio::test]
    async fn exhausted_rate_limit_is_retried_and_then_propagated()
    {
        let limited = RawResponse {
            status:               403,
            body:                 r#"{"message":"API rate limit exceeded"}"#.to_owned(),
            retry_after:          Some(Duration::from_millis(1,),),
            rate_limit_remaining: Some(0,),
        };
        let transport = FakeTransport::default().route("/repos", Vec::new(), Some(limited,),);
        let client = GitHubClient::new(transport, fast_retry(),);

        let error = client.rest_get("/repos/o/r", &[],).await.expect_err("limit persists",);
        match error {
            Error::Http {
                status,
                rate_limited,
                ..
            } => {
                assert_eq!(status, 403);
                assert!(rate_limited);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(client.transport.count("/repos"), 3);
    }

    #[tokio::test]
    async fn transport_failures_are_retried()
    {
        let transport = FakeTransport::default().route(
            "/rate_limit",
            vec![Err(Error::Transport {
                endpoint: "/rate_limit".to_owned(),
                message:  "connection reset".to_owned(),
            },),],
            Some(ok(r#"{"rate":{"remaining":4999}}"#,),),
        );
        let client = GitHubClient::new(transport, fast_retry(),);

        let value = client.rest_get("/rate_limit", &[],).await.expect("retry recovers",);
        assert_eq!(value["rate"]["remaining"], 4999);
    }

    #[tokio::test]
    async fn graphql_posts_query_and_returns_data()
    {
        let client = GitHubClient::new(
            FakeTransport::default().always("/graphql", r#"{"data":{"search":{"issueCount":7}}}"#,),
            fast_retry(),
        );

        let data = client
            .graphql("query { search }", json!({ "q": "repo:o/r" }),)
            .await
            .expect("graphql succeeds",);
        assert_eq!(data["search"]["issueCount"], 7);

        let requests = client.transport.requests();
        assert_eq!(requests[0].method, Method::Post);
        let body = requests[0].body.as_ref().expect("graphql body",);
        assert_eq!(body["variables"]["q"], "repo:o/r");
    }

    #[tokio::test]
    async fn graphql_errors_are_definitive()
    {
        let client = GitHubClient::new(
            FakeTransport::default()
                .always("/graphql", r#"{"errors":[{"message":"Field 'x' doesn't exist"}]}"#,),
            fast_retry(),
        );

        let error = client.graphql("query { x }", json!({}),).await.expect_err("errors array",);
        assert!(matches!(error, Error::GraphQl { .. }));
        assert_eq!(client.transport.count("/graphql"), 1);
    }

    #[tokio::test]
    async fn malformed_json_is_a_decode_error()
    {
        let client =
            GitHubClient::new(FakeTransport::default().always("/repos", "<html>",), fast_retry(),);
        let error = client.rest_get("/repos/o/r", &[],).await.expect_err("decode fails",);
        assert!(matches!(error, Error::Decode { .. }));
    }
}
