// Copyright 2024 raxcloud contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Marker-based pagination.
//!
//! Collections are fetched page by page: the first request goes to the base URL, every next one
//! adds a `marker` query parameter with the value the previous page returned. Iteration stops on
//! the first page without a marker.

use std::collections::HashSet;
use std::fmt;

use log::debug;
use serde::de::DeserializeOwned;

use super::client::RequestBuilder;
use super::{Error, ErrorKind};

/// Name of the query parameter carrying the marker.
pub const MARKER_PARAMETER: &str = "marker";

/// One decoded page of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items in the server's order.
    pub items: Vec<T>,
    /// Marker for the next page, `None` on the last page.
    pub next_marker: Option<String>,
}

impl<T> Page<T> {
    /// Create a page. An empty marker is treated as absent.
    pub fn new(items: Vec<T>, next_marker: Option<String>) -> Page<T> {
        Page {
            items,
            next_marker: next_marker.filter(|m| !m.is_empty()),
        }
    }

    /// Create the last page of a collection.
    #[inline]
    pub fn last(items: Vec<T>) -> Page<T> {
        Page {
            items,
            next_marker: None,
        }
    }
}

/// A resource that can be listed page by page.
pub trait PaginatedResource: Sized {
    /// Envelope of one page as returned by the server.
    type Root: DeserializeOwned + Into<Page<Self>>;
}

type Decoder<T> = Box<dyn Fn(&[u8]) -> Result<Page<T>, Error> + Send + Sync>;

#[derive(Debug)]
enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Fetches a collection following the server-provided markers.
///
/// Pages are requested strictly one after another. The paginator fails with
/// `PaginationLoopDetected` if the server returns a marker it has already returned, or if more
/// pages than allowed by [with_max_pages](#method.with_max_pages) are available.
#[must_use = "a paginator does nothing until it is driven"]
pub struct Paginator<T> {
    builder: RequestBuilder,
    decode: Decoder<T>,
    cursor: Cursor,
    seen: HashSet<String>,
    pages: usize,
    max_pages: Option<usize>,
}

impl<T> fmt::Debug for Paginator<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Paginator")
            .field("builder", &self.builder)
            .field("cursor", &self.cursor)
            .field("pages", &self.pages)
            .field("max_pages", &self.max_pages)
            .finish()
    }
}

impl<T> Paginator<T> {
    /// Create a paginator from a prepared request and a page decoder.
    ///
    /// Fails with `InvalidInput` if the request URL already carries a marker.
    pub fn new<F>(builder: RequestBuilder, decode: F) -> Result<Paginator<T>, Error>
    where
        F: Fn(&[u8]) -> Result<Page<T>, Error> + Send + Sync + 'static,
    {
        if builder
            .url()
            .query_pairs()
            .any(|(key, _)| key == MARKER_PARAMETER)
        {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "Base URL {} must not contain a {} parameter",
                    builder.url(),
                    MARKER_PARAMETER
                ),
            ));
        }

        Ok(Paginator {
            builder,
            decode: Box::new(decode),
            cursor: Cursor::Start,
            seen: HashSet::new(),
            pages: 0,
            max_pages: None,
        })
    }

    /// Limit the number of pages that may be fetched.
    ///
    /// If the server still has a marker after `max_pages` pages, iteration fails with
    /// `PaginationLoopDetected`.
    pub fn with_max_pages(mut self, max_pages: usize) -> Paginator<T> {
        self.max_pages = Some(max_pages);
        self
    }

    /// Number of pages fetched so far.
    #[inline]
    pub fn pages_fetched(&self) -> usize {
        self.pages
    }

    /// Fetch the next page.
    ///
    /// Returns `None` once the last page has been fetched. After an error the paginator is
    /// exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>, Error> {
        let marker = match std::mem::replace(&mut self.cursor, Cursor::Done) {
            Cursor::Done => return Ok(None),
            Cursor::Start => None,
            Cursor::Next(marker) => Some(marker),
        };

        let mut builder = self.builder.try_clone().ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidInput,
                "Paginated requests cannot have a streaming body",
            )
        })?;
        if let Some(ref marker) = marker {
            builder = builder.query(&[(MARKER_PARAMETER, marker)]);
        }

        self.pages += 1;
        let body = builder.send().await?.bytes().await?;
        let page = (self.decode)(&body)?;
        debug!(
            "Page {} of {} has {} item(s), next marker {:?}",
            self.pages,
            self.builder.url(),
            page.items.len(),
            page.next_marker
        );

        if let Some(next) = page.next_marker {
            if let Some(max_pages) = self.max_pages {
                if self.pages >= max_pages {
                    return Err(Error::new(
                        ErrorKind::PaginationLoopDetected,
                        format!(
                            "{} still has more pages after {} page(s)",
                            self.builder.url(),
                            max_pages
                        ),
                    ));
                }
            }
            if !self.seen.insert(next.clone()) {
                return Err(Error::new(
                    ErrorKind::PaginationLoopDetected,
                    format!("{} returned marker {} twice", self.builder.url(), next),
                ));
            }
            self.cursor = Cursor::Next(next);
        }

        Ok(Some(page.items))
    }

    /// Fetch all pages and return the items in the server's order.
    ///
    /// Nothing is returned if any page fails.
    pub async fn fetch_all(mut self) -> Result<Vec<T>, Error> {
        let mut result = Vec::new();
        while let Some(items) = self.next_page().await? {
            result.extend(items);
        }
        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use reqwest::{StatusCode, Url};
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{Page, PaginatedResource, Paginator};
    use crate::client::AuthenticatedClient;
    use crate::ErrorKind;

    #[derive(Debug, Deserialize, PartialEq, Eq)]
    pub struct Item {
        pub id: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct ItemsRoot {
        items: Vec<Item>,
        next: Option<String>,
    }

    impl From<ItemsRoot> for Page<Item> {
        fn from(value: ItemsRoot) -> Page<Item> {
            Page::new(value.items, value.next)
        }
    }

    impl PaginatedResource for Item {
        type Root = ItemsRoot;
    }

    pub fn items(ids: &[&str], next: Option<&str>) -> serde_json::Value {
        json!({
            "items": ids.iter().map(|id| json!({"id": id})).collect::<Vec<_>>(),
            "next": next,
        })
    }

    pub async fn mount_page(
        server: &MockServer,
        marker: Option<&str>,
        response: ResponseTemplate,
        times: u64,
    ) {
        let mock = Mock::given(method("GET")).and(path("/items"));
        let mock = match marker {
            Some(marker) => mock.and(query_param("marker", marker)),
            None => mock.and(query_param_is_missing("marker")),
        };
        mock.respond_with(response)
            .expect(times)
            .mount(server)
            .await;
    }

    pub fn paginator(server: &MockServer) -> Paginator<Item> {
        let url = Url::parse(&format!("{}/items", server.uri())).unwrap();
        AuthenticatedClient::new_noauth()
            .get(url)
            .expect_status(StatusCode::OK)
            .fetch_paginated()
            .unwrap()
    }

    fn ids(items: &[Item]) -> Vec<&str> {
        items.iter().map(|x| x.id.as_str()).collect()
    }

    #[test]
    fn test_page_empty_marker() {
        let page = Page::new(vec![1, 2], Some(String::new()));
        assert_eq!(page, Page::last(vec![1, 2]));
    }

    #[tokio::test]
    async fn test_all_pages_in_order() {
        let server = MockServer::start().await;
        let ok = |ids: &[&str], next| ResponseTemplate::new(200).set_body_json(items(ids, next));
        mount_page(&server, None, ok(&["a", "b"], Some("m1")), 1).await;
        mount_page(&server, Some("m1"), ok(&["c", "d"], Some("m2")), 1).await;
        mount_page(&server, Some("m2"), ok(&["e"], None), 1).await;

        let result = paginator(&server).fetch_all().await.unwrap();
        assert_eq!(ids(&result), vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_empty_collection() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            None,
            ResponseTemplate::new(200).set_body_json(items(&[], None)),
            1,
        )
        .await;

        let result = paginator(&server).fetch_all().await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_failure_discards_pages() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            None,
            ResponseTemplate::new(200).set_body_json(items(&["a"], Some("m1"))),
            1,
        )
        .await;
        mount_page(&server, Some("m1"), ResponseTemplate::new(500), 1).await;
        mount_page(
            &server,
            Some("m2"),
            ResponseTemplate::new(200).set_body_json(items(&["c"], None)),
            0,
        )
        .await;

        let err = paginator(&server).fetch_all().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedStatus);
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn test_decode_failure() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            None,
            ResponseTemplate::new(200).set_body_json(json!({"values": []})),
            1,
        )
        .await;

        let err = paginator(&server).fetch_all().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    }

    #[tokio::test]
    async fn test_repeated_marker() {
        let server = MockServer::start().await;
        let ok = |ids: &[&str], next| ResponseTemplate::new(200).set_body_json(items(ids, next));
        mount_page(&server, None, ok(&["a"], Some("m1")), 1).await;
        mount_page(&server, Some("m1"), ok(&["b"], Some("m1")), 1).await;

        let err = paginator(&server).fetch_all().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PaginationLoopDetected);
    }

    #[tokio::test]
    async fn test_max_pages() {
        let server = MockServer::start().await;
        let ok = |ids: &[&str], next| ResponseTemplate::new(200).set_body_json(items(ids, next));
        mount_page(&server, None, ok(&["a"], Some("m1")), 1).await;
        mount_page(&server, Some("m1"), ok(&["b"], Some("m2")), 1).await;
        mount_page(&server, Some("m2"), ok(&["c"], None), 0).await;

        let err = paginator(&server)
            .with_max_pages(2)
            .fetch_all()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PaginationLoopDetected);
    }

    #[tokio::test]
    async fn test_next_page() {
        let server = MockServer::start().await;
        let ok = |ids: &[&str], next| ResponseTemplate::new(200).set_body_json(items(ids, next));
        mount_page(&server, None, ok(&["a"], Some("m 1&x")), 1).await;
        mount_page(&server, Some("m 1&x"), ok(&["b"], None), 1).await;

        let mut pager = paginator(&server);
        assert_eq!(ids(&pager.next_page().await.unwrap().unwrap()), vec!["a"]);
        assert_eq!(ids(&pager.next_page().await.unwrap().unwrap()), vec!["b"]);
        assert!(pager.next_page().await.unwrap().is_none());
        assert_eq!(pager.pages_fetched(), 2);
    }

    #[tokio::test]
    async fn test_custom_decoder() {
        let server = MockServer::start().await;
        let ok = |body| ResponseTemplate::new(200).set_body_json(body);
        mount_page(&server, None, ok(json!({"ids": ["a", "b"], "cursor": "m1"})), 1).await;
        mount_page(&server, Some("m1"), ok(json!({"ids": ["c"], "cursor": ""})), 1).await;

        let url = Url::parse(&format!("{}/items", server.uri())).unwrap();
        let pager = AuthenticatedClient::new_noauth()
            .get(url)
            .fetch_paginated_with(|body: &[u8]| {
                let value: serde_json::Value = serde_json::from_slice(body)?;
                let ids: Vec<String> = value["ids"]
                    .as_array()
                    .map(|ids| ids.iter().filter_map(|id| id.as_str()).map(String::from).collect())
                    .unwrap_or_default();
                let cursor = value["cursor"].as_str().map(String::from);
                Ok(Page::new(ids, cursor))
            })
            .unwrap();

        let result: Vec<String> = pager.fetch_all().await.unwrap();
        assert_eq!(result, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_marker_in_base_url() {
        let url = Url::parse("http://127.0.0.1/items?marker=abc").unwrap();
        let err = AuthenticatedClient::new_noauth()
            .get(url)
            .fetch_paginated::<Item>()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
