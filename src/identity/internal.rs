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

//! Internal implementation of the identity authentication.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

use chrono::{Duration, Utc};
use log::{debug, trace};
use reqwest::{Client, RequestBuilder, Url};
use tokio::sync::{RwLock, RwLockReadGuard};

use super::protocol::{self, AuthRoot};
use super::TOKEN_MIN_VALIDITY;
use crate::auth::AUTH_TOKEN_HEADER;
use crate::client;
use crate::{catalog, EndpointFilters, Error, ErrorKind, InterfaceType};

/// Plain authentication token without additional details.
#[derive(Clone)]
pub(crate) struct Token {
    body: protocol::Access,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut hasher = DefaultHasher::new();
        self.body.token.id.hash(&mut hasher);
        write!(
            f,
            "Token {{ value: hash({}), expires: {}, tenant: {:?} }}",
            hasher.finish(),
            self.body.token.expires,
            self.body.token.tenant
        )
    }
}

/// Internal identity authentication object.
#[derive(Debug)]
pub(crate) struct Internal {
    auth_url: Url,
    body: AuthRoot,
    token_endpoint: String,
    cached_token: RwLock<Option<Token>>,
    pub filters: EndpointFilters,
}

impl Internal {
    /// Create a new implementation.
    pub fn new(mut auth_url: Url, body: AuthRoot) -> Result<Internal, Error> {
        let _ = auth_url
            .path_segments_mut()
            .map_err(|_| Error::new(ErrorKind::InvalidConfig, "Invalid auth_url: wrong schema?"))?
            .pop_if_empty();

        let base = auth_url.as_str().trim_end_matches('/');
        let token_endpoint = if base.ends_with("/v2.0") {
            format!("{}/tokens", base)
        } else {
            format!("{}/v2.0/tokens", base)
        };

        Ok(Internal {
            auth_url,
            body,
            token_endpoint,
            cached_token: RwLock::new(None),
            filters: EndpointFilters::default(),
        })
    }

    /// Access to the auth URL.
    #[inline]
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    /// Access to the authentication body.
    #[inline]
    pub fn body(&self) -> &AuthRoot {
        &self.body
    }

    /// Mutable access to the authentication body.
    ///
    /// Drops the cached token since it may no longer match the credentials.
    #[inline]
    pub fn body_mut(&mut self) -> &mut AuthRoot {
        *self.cached_token.get_mut() = None;
        &mut self.body
    }

    /// Access to the cached token.
    pub async fn cached_token(&self, client: &Client) -> Result<RwLockReadGuard<'_, Token>, Error> {
        self.refresh(client, false).await?;
        let guard = self.cached_token.read().await;
        RwLockReadGuard::try_map(guard, |opt| opt.as_ref()).map_err(|_| {
            Error::new(
                ErrorKind::AuthenticationFailed,
                "Token is not populated after refreshing",
            )
        })
    }

    /// Get a URL for the requested service.
    pub async fn get_endpoint(
        &self,
        client: &Client,
        service_type: &str,
        filters: &EndpointFilters,
    ) -> Result<Url, Error> {
        let real_filters = self.with_defaults(filters);
        debug!(
            "Requesting a catalog endpoint for service '{}', filters {:?}",
            service_type, real_filters
        );
        let token = self.cached_token(client).await?;
        catalog::extract_url(&token.body.catalog, service_type, &real_filters)
    }

    /// Fill in the region and interface of this authentication where filters leave them unset.
    fn with_defaults(&self, filters: &EndpointFilters) -> EndpointFilters {
        let mut result = filters.clone();
        if result.region.is_none() {
            result.region.clone_from(&self.filters.region);
        }
        if result.interface == InterfaceType::default() {
            result.interface = self.filters.interface;
        }
        result
    }

    /// Get the authentication token string.
    #[inline]
    pub async fn get_token(&self, client: &Client) -> Result<String, Error> {
        let token = self.cached_token(client).await?;
        Ok(token.body.token.id.clone())
    }

    /// Tenant ID of the current token, if known.
    pub async fn tenant_id(&self, client: &Client) -> Result<Option<String>, Error> {
        let token = self.cached_token(client).await?;
        Ok(token.body.token.tenant.as_ref().map(|t| t.id.clone()))
    }

    /// Refresh the token (if needed or forced).
    pub async fn refresh(&self, client: &Client, force: bool) -> Result<(), Error> {
        // This is executed every request at least once, so it's important to start with a read
        // lock. We expect to hit this branch most of the time.
        if !force && token_alive(&self.cached_token.read().await) {
            return Ok(());
        }

        let mut lock = self.cached_token.write().await;
        // Another task may have updated the token while we were waiting for the write lock.
        if !force && token_alive(&lock) {
            return Ok(());
        }

        debug!("Requesting a new token from {}", self.token_endpoint);
        let resp = client
            .post(&self.token_endpoint)
            .json(&self.body)
            .send()
            .await?;
        let resp = client::check(resp).await?;
        let root = resp.json::<protocol::AccessRoot>().await?;
        debug!("Received a token expiring at {}", root.access.token.expires);
        trace!("Received catalog: {:?}", root.access.catalog);
        *lock = Some(Token { body: root.access });
        Ok(())
    }

    /// Create an authenticated request.
    pub async fn authenticate(
        &self,
        client: &Client,
        request: RequestBuilder,
    ) -> Result<RequestBuilder, Error> {
        let token = self.get_token(client).await?;
        Ok(request.header(AUTH_TOKEN_HEADER, token))
    }

    #[cfg(test)]
    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint
    }
}

impl Clone for Internal {
    fn clone(&self) -> Internal {
        Internal {
            auth_url: self.auth_url.clone(),
            body: self.body.clone(),
            token_endpoint: self.token_endpoint.clone(),
            cached_token: RwLock::new(None),
            filters: self.filters.clone(),
        }
    }
}

#[inline]
fn token_alive(token: &impl Deref<Target = Option<Token>>) -> bool {
    if let Some(value) = token.deref() {
        let validity_time_left = value.body.token.expires.signed_duration_since(Utc::now());
        trace!("Token is valid for {:?}", validity_time_left);
        validity_time_left > Duration::minutes(TOKEN_MIN_VALIDITY)
    } else {
        false
    }
}
