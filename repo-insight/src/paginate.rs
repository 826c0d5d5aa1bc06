// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Page and cursor loops shared by the fetchers.
//!
//! REST collections are walked with `page`/`per_page` until the first empty
//! page. GraphQL connections follow `pageInfo.endCursor` until
//! `hasNextPage` turns false. Both loops also stop at a page bound and an
//! optional record bound so a misbehaving endpoint cannot spin forever.

use std::future::Future;

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    client::{GitHubClient, Transport},
    error::Error,
};

/// Bounds applied to a paginated fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub struct PageBounds
{
    /// Items requested per page.
    pub per_page:    u32,
    /// Maximum number of pages requested.
    pub max_pages:   u32,
    /// Maximum number of records kept, if any.
    pub max_records: Option<usize,>,
}

impl PageBounds
{
    /// Bounds with a page limit only.
    pub fn pages(per_page: u32, max_pages: u32,) -> Self
    {
        Self {
            per_page, max_pages, max_records: None,
        }
    }

    /// Adds a record limit.
    pub fn with_max_records(self, max_records: usize,) -> Self
    {
        Self {
            max_records: Some(max_records,), ..self
        }
    }
}

/// One page of a GraphQL connection.
#[derive(Debug, Clone, PartialEq,)]
pub struct Connection<T,>
{
    /// Nodes returned on this page, with null nodes already removed.
    pub nodes:         Vec<T,>,
    /// Whether the server reports a further page.
    pub has_next_page: bool,
    /// Cursor to request the next page with.
    pub end_cursor:    Option<String,>,
}

#[derive(Debug, Deserialize,)]
#[serde(rename_all = "camelCase")]
struct RawConnection
{
    #[serde(default)]
    nodes:     Vec<Value,>,
    page_info: Option<RawPageInfo,>,
}

#[derive(Debug, Default, Deserialize,)]
#[serde(rename_all = "camelCase")]
struct RawPageInfo
{
    #[serde(default)]
    has_next_page: bool,
    end_cursor:    Option<String,>,
}

impl<T: DeserializeOwned,> Connection<T,>
{
    /// Decodes a GraphQL connection object, skipping nodes that are null or do
    /// not match `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] when `value` is not a connection object.
    pub fn from_value(value: Value,) -> Result<Self, Error,>
    {
        let raw: RawConnection = serde_json::from_value(value,)?;
        let page_info = raw.page_info.unwrap_or_default();

        Ok(Self {
            nodes:         decode_items(raw.nodes,),
            has_next_page: page_info.has_next_page,
            end_cursor:    page_info.end_cursor,
        },)
    }
}

/// Decodes each element independently, logging and skipping malformed ones.
pub fn decode_items<T: DeserializeOwned,>(items: Vec<Value,>,) -> Vec<T,>
{
    items
        .into_iter()
        .filter(|item| !item.is_null(),)
        .filter_map(|item| match serde_json::from_value(item,) {
            Ok(decoded,) => Some(decoded,),
            Err(e,) => {
                warn!("skipping malformed record: {}", e);
                None
            }
        },)
        .collect()
}

/// Collects REST pages starting at page 1.
///
/// `fetch_page` receives the 1-based page number. The loop ends at the first
/// empty page, after `max_pages` pages, or once `max_records` items are held
/// (the surplus of the last page is dropped).
///
/// # Errors
///
/// Propagates the first error returned by `fetch_page`; items from earlier
/// pages are discarded.
pub async fn collect_pages<T, F, Fut,>(bounds: PageBounds, mut fetch_page: F,) -> Result<Vec<T,>, Error,>
where
    F: FnMut(u32,) -> Fut,
    Fut: Future<Output = Result<Vec<T,>, Error,>,>,
{
    let mut collected = Vec::new();

    for page in 1..=bounds.max_pages {
        let items = fetch_page(page,).await?;
        if items.is_empty() {
            debug!("page {} is empty, stopping", page);
            return Ok(collected,);
        }

        collected.extend(items,);
        if let Some(limit,) = bounds.max_records
            && collected.len() >= limit
        {
            collected.truncate(limit,);
            debug!("record limit {} reached on page {}", limit, page);
            return Ok(collected,);
        }
    }

    if bounds.max_pages > 0 {
        warn!("stopped after {} pages without reaching an empty page", bounds.max_pages);
    }
    Ok(collected,)
}

/// Collects GraphQL connection pages starting without a cursor.
///
/// The loop ends when `hasNextPage` is false, when the server omits the end
/// cursor, after `max_pages` pages, or once `max_records` nodes are held.
///
/// # Errors
///
/// Propagates the first error returned by `fetch_page`.
pub async fn collect_cursor_pages<T, F, Fut,>(
    bounds: PageBounds,
    mut fetch_page: F,
) -> Result<Vec<T,>, Error,>
where
    F: FnMut(Option<String,>,) -> Fut,
    Fut: Future<Output = Result<Connection<T,>, Error,>,>,
{
    let mut collected = Vec::new();
    let mut cursor = None;

    for _ in 0..bounds.max_pages {
        let connection = fetch_page(cursor.take(),).await?;
        collected.extend(connection.nodes,);

        if let Some(limit,) = bounds.max_records
            && collected.len() >= limit
        {
            collected.truncate(limit,);
            return Ok(collected,);
        }

        match connection.end_cursor {
            Some(next,) if connection.has_next_page => cursor = Some(next,),
            _ => return Ok(collected,),
        }
    }

    if bounds.max_pages > 0 {
        warn!("stopped after {} GraphQL pages with more results pending", bounds.max_pages);
    }
    Ok(collected,)
}

impl<T: Transport,> GitHubClient<T,>
{
    /// Walks a REST collection endpoint with `page`/`per_page` parameters.
    ///
    /// `query` carries endpoint-specific filters. Elements that fail to decode
    /// as `R` are skipped with a warning; a page counts as empty only when the
    /// server returned no elements at all.
    ///
    /// # Errors
    ///
    /// Propagates request errors from any page.
    pub async fn rest_paginate<R: DeserializeOwned,>(
        &self,
        path: &str,
        query: &[(&str, String,)],
        bounds: PageBounds,
    ) -> Result<Vec<R,>, Error,>
    {
        let raw = collect_pages(bounds, |page| async move {
            let mut params = query.to_vec();
            params.push(("per_page", bounds.per_page.to_string(),),);
            params.push(("page", page.to_string(),),);

            match self.rest_get(path, &params,).await? {
                Value::Array(items,) => Ok(items,),
                Value::Null => Ok(Vec::new(),),
                other => Err(Error::validation(format!(
                    "expected a JSON array from {path}, got {}",
                    kind(&other,)
                ),),),
            }
        },)
        .await?;

        Ok(decode_items(raw,),)
    }

    /// Walks a GraphQL `search` connection.
    ///
    /// `query` must declare `$q: String!` and `$cursor: String` and select
    /// `search { nodes pageInfo { hasNextPage endCursor } }`.
    ///
    /// # Errors
    ///
    /// Propagates request and GraphQL errors from any page.
    pub async fn search_paginate<R: DeserializeOwned,>(
        &self,
        query: &str,
        search: &str,
        bounds: PageBounds,
    ) -> Result<Vec<R,>, Error,>
    {
        collect_cursor_pages(bounds, |cursor| async move {
            let mut data = self
                .graphql(query, serde_json::json!({ "q": search, "cursor": cursor }),)
                .await?;
            Connection::from_value(data.get_mut("search",).map(Value::take,).unwrap_or(Value::Null,),)
        },)
        .await
    }
}

fn kind(value: &Value,) -> &'static str
{
    match value {
        Value::Null => "null",
        Value::Bool(_,) => "boolean",
        Value::Number(_,) => "number",
        Value::String(_,) => "string",
        Value::Array(_,) => "array",
        Value::Object(_,) => "object",
    }
}

#[cfg(test)]
mod tests
{
    use std::sync::atomic::{AtomicU32, Ordering};

    use serde::Deserialize;

    use super::*;
    use crate::{
        client::fake::{FakeTransport, ok},
        retry::RetryConfig,
    };

    #[derive(Debug, Deserialize, PartialEq,)]
    struct Item
    {
        id: u32,
    }

    fn client(transport: FakeTransport,) -> GitHubClient<FakeTransport,>
    {
        GitHubClient::new(
            transport,
            RetryConfig {
                max_attempts: 2, initial_delay_ms: 1, backoff_factor: 1.0, max_jitter_ms: 0,
            },
        )
    }

    #[tokio::test]
    async fn stops_at_first_empty_page()
    {
        let calls = AtomicU32::new(0,);
        let items = collect_pages(PageBounds::pages(2, 10,), |page| {
            calls.fetch_add(1, Ordering::SeqCst,);
            async move {
                Ok(match page {
                    1 => vec![1, 2],
                    2 => vec![3],
                    _ => Vec::new(),
                },)
            }
        },)
        .await
        .expect("pages collected",);

        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn first_page_empty_yields_nothing()
    {
        let items: Vec<u32,> =
            collect_pages(PageBounds::pages(100, 10,), |_| async { Ok(Vec::new(),) },)
                .await
                .expect("empty collection",);
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn max_pages_bounds_endless_endpoints()
    {
        let calls = AtomicU32::new(0,);
        let items = collect_pages(PageBounds::pages(1, 4,), |page| {
            calls.fetch_add(1, Ordering::SeqCst,);
            async move { Ok(vec![page],) }
        },)
        .await
        .expect("bounded collection",);

        assert_eq!(items, vec![1, 2, 3, 4]);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn max_records_truncates_last_page()
    {
        let items = collect_pages(PageBounds::pages(3, 10,).with_max_records(5,), |page| async move {
            Ok(vec![page; 3],)
        },)
        .await
        .expect("bounded collection",);
        assert_eq!(items, vec![1, 1, 1, 2, 2]);
    }

    #[tokio::test]
    async fn page_errors_propagate()
    {
        let result: Result<Vec<u32,>, Error,> = collect_pages(PageBounds::pages(1, 5,), |page| async move {
            if page == 2 { Err(Error::validation("boom",),) } else { Ok(vec![page],) }
        },)
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[tokio::test]
    async fn cursor_loop_follows_end_cursor()
    {
        let seen = std::sync::Mutex::new(Vec::new(),);
        let items = collect_cursor_pages(PageBounds::pages(2, 10,), |cursor| {
            seen.lock().expect("lock",).push(cursor.clone(),);
            async move {
                Ok(match cursor.as_deref() {
                    None => Connection {
                        nodes: vec![1, 2], has_next_page: true, end_cursor: Some("c1".to_owned(),),
                    },
                    Some("c1",) => Connection {
                        nodes: vec![3], has_next_page: false, end_cursor: Some("c2".to_owned(),),
                    },
                    Some(other,) => panic!("unexpected cursor {other}"),
                },)
            }
        },)
        .await
        .expect("cursor pages",);

        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(*seen.lock().expect("lock",), vec![None, Some("c1".to_owned())]);
    }

    #[tokio::test]
    async fn cursor_loop_stops_without_cursor_and_at_page_bound()
    {
        let missing = collect_cursor_pages(PageBounds::pages(1, 10,), |_| async {
            Ok(Connection {
                nodes: vec![7], has_next_page: true, end_cursor: None,
            },)
        },)
        .await
        .expect("stops on missing cursor",);
        assert_eq!(missing, vec![7]);

        let bounded = collect_cursor_pages(PageBounds::pages(1, 3,), |_| async {
            Ok(Connection {
                nodes: vec![1], has_next_page: true, end_cursor: Some("same".to_owned(),),
            },)
        },)
        .await
        .expect("stops at page bound",);
        assert_eq!(bounded.len(), 3);
    }

    #[test]
    fn connection_skips_null_and_malformed_nodes()
    {
        let connection: Connection<Item,> = Connection::from_value(serde_json::json!({
            "nodes": [{ "id": 1 }, null, { "id": "x" }, { "id": 4 }],
            "pageInfo": { "hasNextPage": true, "endCursor": "abc" }
        }),)
        .expect("connection decodes",);

        assert_eq!(connection.nodes, vec![Item { id: 1 }, Item { id: 4 }]);
        assert!(connection.has_next_page);
        assert_eq!(connection.end_cursor.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn rest_paginate_sends_page_parameters()
    {
        let transport = FakeTransport::default()
            .route(
                "/repos/o/r/branches",
                vec![Ok(ok(r#"[{"id":1},{"id":2}]"#,),), Ok(ok("[]",),)],
                None,
            );
        let client = client(transport,);

        let items: Vec<Item,> = client
            .rest_paginate("/repos/o/r/branches", &[], PageBounds::pages(2, 5,),)
            .await
            .expect("pagination succeeds",);

        assert_eq!(items, vec![Item { id: 1 }, Item { id: 2 }]);
        let paths: Vec<String,> =
            client_requests(&client,).into_iter().map(|request| request.path,).collect();
        assert_eq!(paths, vec![
            "/repos/o/r/branches?per_page=2&page=1".to_owned(),
            "/repos/o/r/branches?per_page=2&page=2".to_owned(),
        ]);
    }

    #[tokio::test]
    async fn malformed_page_does_not_end_the_walk()
    {
        let transport = FakeTransport::default().route(
            "/repos/o/r/branches",
            vec![
                Ok(ok(r#"[{"id":1}]"#,),),
                Ok(ok(r#"[{"id":"bad"}]"#,),),
                Ok(ok(r#"[{"id":3}]"#,),),
                Ok(ok("[]",),),
            ],
            None,
        );
        let client = client(transport,);

        let items: Vec<Item,> = client
            .rest_paginate("/repos/o/r/branches", &[], PageBounds::pages(1, 10,),)
            .await
            .expect("pagination succeeds",);

        assert_eq!(items, vec![Item { id: 1 }, Item { id: 3 }]);
        assert_eq!(client.transport().count("/repos/o/r/branches"), 4);
    }

    #[tokio::test]
    async fn rest_paginate_rejects_non_array_payloads()
    {
        let client = client(FakeTransport::default().always("/repos/o/r/branches", r#"{"id":1}"#,),);
        let result: Result<Vec<Item,>, Error,> =
            client.rest_paginate("/repos/o/r/branches", &[], PageBounds::pages(2, 5,),).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[tokio::test]
    async fn search_paginate_walks_cursor()
    {
        let transport = FakeTransport::default().route(
            "/graphql",
            vec![
                Ok(ok(
                    r#"{"data":{"search":{"nodes":[{"id":1}],"pageInfo":{"hasNextPage":true,"endCursor":"n1"}}}}"#,
                ),),
                Ok(ok(
                    r#"{"data":{"search":{"nodes":[{"id":2}],"pageInfo":{"hasNextPage":false,"endCursor":null}}}}"#,
                ),),
            ],
            None,
        );
        let client = client(transport,);

        let items: Vec<Item,> = client
            .search_paginate("query", "repo:o/r is:pr", PageBounds::pages(50, 10,),)
            .await
            .expect("search succeeds",);
        assert_eq!(items, vec![Item { id: 1 }, Item { id: 2 }]);

        let requests = client_requests(&client,);
        let second = requests[1].body.as_ref().expect("graphql body",);
        assert_eq!(second["variables"]["cursor"], "n1");
    }

    fn client_requests(client: &GitHubClient<FakeTransport,>,) -> Vec<crate::client::ApiRequest,>
    {
        client.transport().requests()
    }
}
