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

//! Low-level authenticated client.

use std::collections::HashMap;
use std::convert::TryFrom;
use std::sync::Arc;
use std::time::Duration;

use http::header::{HeaderName, HeaderValue};
use http::Error as HttpError;
use log::trace;
use reqwest::{Client, Method, Request, RequestBuilder as HttpRequestBuilder, Response, Url};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use static_assertions::assert_eq_size;

use super::pagination::{Page, PaginatedResource, Paginator};
use super::{AuthType, EndpointFilters, Error};

/// Authenticated HTTP client.
///
/// Uses `Arc` internally and should be reused when possible by cloning it.
/// Each instance owns its HTTP client, so instances configured differently never affect
/// each other.
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    client: Client,
    auth: Arc<dyn AuthType>,
}

assert_eq_size!(AuthenticatedClient, Option<AuthenticatedClient>);

impl AuthenticatedClient {
    /// Create a new authenticated client.
    ///
    /// Authenticates immediately, so that credential problems surface here.
    pub async fn new<Auth: AuthType + 'static>(
        client: Client,
        auth_type: Auth,
    ) -> Result<AuthenticatedClient, Error> {
        auth_type.refresh(&client).await?;
        Ok(AuthenticatedClient::new_internal(
            client,
            Arc::new(auth_type),
        ))
    }

    #[inline]
    pub(crate) fn new_internal(client: Client, auth: Arc<dyn AuthType>) -> AuthenticatedClient {
        AuthenticatedClient { client, auth }
    }

    /// Create a new client without authenticating first.
    ///
    /// The first request will authenticate if needed.
    #[inline]
    pub fn new_lazy<Auth: AuthType + 'static>(client: Client, auth_type: Auth) -> Self {
        AuthenticatedClient::new_internal(client, Arc::new(auth_type))
    }

    /// Get a reference to the authentication type in use.
    #[inline]
    pub fn auth_type(&self) -> &dyn AuthType {
        self.auth.as_ref()
    }

    /// Authenticate a request.
    #[inline]
    async fn authenticate(&self, request: HttpRequestBuilder) -> Result<Request, Error> {
        self.auth
            .authenticate(&self.client, request)
            .await?
            .build()
            .map_err(Error::from)
    }

    /// Get a URL for the requested service.
    #[inline]
    pub async fn get_endpoint(
        &self,
        service_type: &str,
        filters: &EndpointFilters,
    ) -> Result<Url, Error> {
        self.auth
            .get_endpoint(&self.client, service_type, filters)
            .await
    }

    /// Get a reference to the inner (non-authenticated) client.
    #[inline]
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Update the authentication.
    ///
    /// # Warning
    ///
    /// Authentication will also be updated for clones of this client, since they share the same
    /// authentication object.
    #[inline]
    pub async fn refresh(&mut self) -> Result<(), Error> {
        self.auth.refresh(&self.client).await
    }

    /// Set a new authentication for this client.
    #[inline]
    pub fn set_auth_type<Auth: AuthType + 'static>(&mut self, auth_type: Auth) {
        self.auth = Arc::new(auth_type);
    }

    /// Set a new internal client implementation.
    #[inline]
    pub fn set_inner(&mut self, client: Client) {
        self.client = client;
    }

    /// Start an authenticated request.
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        RequestBuilder {
            inner: self.client.request(method.clone(), url.clone()),
            client: self.clone(),
            method,
            url,
            expected: Vec::new(),
        }
    }

    /// Start an authenticated GET request.
    #[inline]
    pub fn get(&self, url: Url) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Start an authenticated POST request.
    #[inline]
    pub fn post(&self, url: Url) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Start an authenticated DELETE request.
    #[inline]
    pub fn delete(&self, url: Url) -> RequestBuilder {
        self.request(Method::DELETE, url)
    }

    #[cfg(test)]
    pub(crate) fn new_noauth() -> AuthenticatedClient {
        use crate::NoAuth;
        AuthenticatedClient::new_lazy(Client::new(), NoAuth::new_without_endpoint())
    }
}

impl From<AuthenticatedClient> for Client {
    fn from(value: AuthenticatedClient) -> Client {
        value.client
    }
}

/// A request builder with error handling.
#[derive(Debug)]
#[must_use = "preparing a request is not enough to run it"]
pub struct RequestBuilder {
    inner: HttpRequestBuilder,
    client: AuthenticatedClient,
    method: Method,
    url: Url,
    expected: Vec<StatusCode>,
}

#[derive(Debug, Deserialize)]
struct Message {
    message: Option<String>,
    details: Option<String>,
}

impl From<Message> for Option<String> {
    fn from(value: Message) -> Option<String> {
        value.message.or(value.details)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorResponse {
    Map(HashMap<String, Message>),
    Message(Message),
}

fn extract_message(text: String) -> String {
    serde_json::from_str::<ErrorResponse>(&text)
        .ok()
        .and_then(|body| match body {
            ErrorResponse::Map(map) => map.into_iter().next().and_then(|(_k, v)| v.into()),
            ErrorResponse::Message(msg) => msg.into(),
        })
        .unwrap_or(text)
}

/// Check for API errors in the response.
///
/// Any successful (2xx) status is accepted.
#[inline]
pub async fn check(response: Response) -> Result<Response, Error> {
    check_expected(response, &[]).await
}

/// Check that the response status is one of the expected ones.
///
/// An empty `expected` list accepts any successful (2xx) status.
pub async fn check_expected(
    response: Response,
    expected: &[StatusCode],
) -> Result<Response, Error> {
    let status = response.status();
    let acceptable = if expected.is_empty() {
        status.is_success()
    } else {
        expected.contains(&status)
    };

    if acceptable {
        trace!("HTTP request to {} returned {}", response.url(), status);
        return Ok(response);
    }

    let message = if status.is_client_error() || status.is_server_error() {
        let text = response.text().await?;
        if text.is_empty() {
            status.canonical_reason().unwrap_or("Unknown error").to_string()
        } else {
            extract_message(text)
        }
    } else {
        format!("Status {} is not one of the expected {:?}", status, expected)
    };
    trace!("HTTP request returned {}; error: {}", status, message);
    Err(Error::new(status.into(), message).with_status(status))
}

impl RequestBuilder {
    /// URL of the request (without the query added by [query](#method.query)).
    #[inline]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// HTTP method of the request.
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Add a header to the request.
    pub fn header<K, V>(self, key: K, value: V) -> RequestBuilder
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<HttpError>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<HttpError>,
    {
        RequestBuilder {
            inner: self.inner.header(key, value),
            ..self
        }
    }

    /// Add a JSON body to the request.
    pub fn json<T: Serialize + ?Sized>(self, json: &T) -> RequestBuilder {
        RequestBuilder {
            inner: self.inner.json(json),
            ..self
        }
    }

    /// Send a query with the request.
    pub fn query<T: Serialize + ?Sized>(self, query: &T) -> RequestBuilder {
        RequestBuilder {
            inner: self.inner.query(query),
            ..self
        }
    }

    /// Override the timeout for the request.
    pub fn timeout(self, timeout: Duration) -> RequestBuilder {
        RequestBuilder {
            inner: self.inner.timeout(timeout),
            ..self
        }
    }

    /// Add a status to the set of acceptable statuses.
    ///
    /// Without any expected statuses, any successful (2xx) status is accepted.
    pub fn expect_status(mut self, status: StatusCode) -> RequestBuilder {
        if !self.expected.contains(&status) {
            self.expected.push(status);
        }
        self
    }

    /// Add several statuses to the set of acceptable statuses.
    pub fn expect_statuses<I>(self, statuses: I) -> RequestBuilder
    where
        I: IntoIterator<Item = StatusCode>,
    {
        statuses
            .into_iter()
            .fold(self, |builder, status| builder.expect_status(status))
    }

    /// Send the request and receive JSON in response.
    pub async fn fetch_json<T>(self) -> Result<T, Error>
    where
        T: DeserializeOwned + Send,
    {
        let body = self.send().await?.bytes().await?;
        serde_json::from_slice(&body).map_err(Error::from)
    }

    /// Send the request and check for errors.
    pub async fn send(self) -> Result<Response, Error> {
        let expected = self.expected.clone();
        check_expected(self.send_unchecked().await?, &expected).await
    }

    /// Send the request without checking for HTTP errors.
    pub async fn send_unchecked(self) -> Result<Response, Error> {
        let req = self.client.authenticate(self.inner).await?;
        trace!("Sending HTTP {} request to {}", req.method(), req.url());
        self.client.client.execute(req).await.map_err(Error::from)
    }

    /// Attempt to clone this request builder.
    ///
    /// Fails for streaming bodies.
    pub fn try_clone(&self) -> Option<RequestBuilder> {
        self.inner.try_clone().map(|inner| RequestBuilder {
            inner,
            client: self.client.clone(),
            method: self.method.clone(),
            url: self.url.clone(),
            expected: self.expected.clone(),
        })
    }

    /// Prepare fetching all pages of a collection of `T`.
    ///
    /// The requests happen only when the resulting [Paginator](../struct.Paginator.html) is
    /// driven.
    ///
    /// ```rust,no_run
    /// # async fn example() -> Result<(), raxcloud::Error> {
    /// use serde::Deserialize;
    ///
    /// #[derive(Debug, Deserialize)]
    /// pub struct Alarm {
    ///     pub id: String,
    /// }
    ///
    /// impl raxcloud::PaginatedResource for Alarm {
    ///     type Root = raxcloud::monitoring::PaginatedList<Alarm>;
    /// }
    ///
    /// let auth = raxcloud::StaticToken::new("https://monitoring.local/v1.0/123456", "token")?;
    /// let client = raxcloud::AuthenticatedClient::new_lazy(reqwest::Client::new(), auth);
    /// let url = reqwest::Url::parse("https://monitoring.local/v1.0/123456/entities/en1/alarms")
    ///     .expect("valid URL");
    ///
    /// let alarms: Vec<Alarm> = client.get(url).fetch_paginated()?.fetch_all().await?;
    /// # Ok(()) }
    /// ```
    #[inline]
    pub fn fetch_paginated<T>(self) -> Result<Paginator<T>, Error>
    where
        T: PaginatedResource,
    {
        Paginator::new(self, |body: &[u8]| {
            let root: T::Root = serde_json::from_slice(body)?;
            Ok(root.into())
        })
    }

    /// Prepare fetching all pages using a custom page decoder.
    #[inline]
    pub fn fetch_paginated_with<T, F>(self, decode: F) -> Result<Paginator<T>, Error>
    where
        F: Fn(&[u8]) -> Result<Page<T>, Error> + Send + Sync + 'static,
    {
        Paginator::new(self, decode)
    }
}


#[cfg(test)]
mod test_extract_message {
    use super::extract_message;

    #[test]
    fn test_plain() {
        let msg = "<html><body>I failed</body></html>";
        let result = extract_message(msg.to_string());
        assert_eq!(result, msg);
    }

    #[test]
    fn test_simple_message() {
        let msg = r#"{"message": "I failed"}"#;
        let result = extract_message(msg.to_string());
        assert_eq!(result, "I failed");
    }

    #[test]
    fn test_nested_message() {
        let msg = r#"{"itemNotFound": {"message": "Instance could not be found", "code": 404}}"#;
        let result = extract_message(msg.to_string());
        assert_eq!(result, "Instance could not be found");
    }

    #[test]
    fn test_details_only() {
        let msg = r#"{"type": "badRequest", "code": 400, "details": "Validation error"}"#;
        let result = extract_message(msg.to_string());
        assert_eq!(result, "Validation error");
    }
}
