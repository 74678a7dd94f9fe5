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

//! API key authentication.

use async_trait::async_trait;
use reqwest::{Client, IntoUrl, RequestBuilder, Url};

use super::internal::Internal;
use super::protocol;
use super::Identity;
use crate::{AuthType, EndpointFilters, Error, InterfaceType};

/// API key authentication using the `RAX-KSKEY` extension of Identity API v2.0.
///
/// ```rust,no_run
/// let auth = raxcloud::identity::ApiKey::new(
///     raxcloud::identity::DEFAULT_AUTH_URL,
///     "admin",
///     "0123456789abcdef",
/// )
/// .expect("Invalid auth_url")
/// .with_region("ORD");
///
/// let session = raxcloud::Session::new(auth);
/// ```
///
/// The authentication token is cached while it's still valid or until
/// [refresh](../trait.AuthType.html#tymethod.refresh) is called.
/// Clones of an `ApiKey` start with an empty cache.
#[derive(Debug, Clone)]
pub struct ApiKey {
    inner: Internal,
}

impl Identity for ApiKey {
    fn auth_url(&self) -> &Url {
        self.inner.auth_url()
    }
}

impl ApiKey {
    /// Create an API key authentication.
    pub fn new<U, S1, S2>(auth_url: U, user_name: S1, api_key: S2) -> Result<ApiKey, Error>
    where
        U: IntoUrl,
        S1: Into<String>,
        S2: Into<String>,
    {
        let auth_url = auth_url.into_url()?;
        let body = protocol::AuthRoot {
            auth: protocol::Auth {
                credentials: protocol::Credentials::ApiKey(protocol::ApiKeyCredentials {
                    username: user_name.into(),
                    api_key: api_key.into(),
                }),
                tenant_id: None,
            },
        };
        Ok(ApiKey {
            inner: Internal::new(auth_url, body)?,
        })
    }

    /// Endpoint filters.
    #[inline]
    pub fn endpoint_filters(&self) -> &EndpointFilters {
        &self.inner.filters
    }

    /// Set the default endpoint interface to use.
    #[inline]
    pub fn set_default_endpoint_interface(&mut self, endpoint_interface: InterfaceType) {
        self.inner.filters.interface = endpoint_interface;
    }

    /// Set a region for this authentication method.
    #[inline]
    pub fn set_region<S: Into<String>>(&mut self, region: S) {
        self.inner.filters.region = Some(region.into());
    }

    /// Scope the token to a tenant.
    #[inline]
    pub fn set_tenant<S: Into<String>>(&mut self, tenant_id: S) {
        self.inner.body_mut().auth.tenant_id = Some(tenant_id.into());
    }

    /// Convert this authentication into one using the given endpoint interface.
    #[inline]
    pub fn with_default_endpoint_interface(mut self, endpoint_interface: InterfaceType) -> Self {
        self.set_default_endpoint_interface(endpoint_interface);
        self
    }

    /// Set a region for this authentication method.
    #[inline]
    pub fn with_region<S: Into<String>>(mut self, region: S) -> Self {
        self.set_region(region);
        self
    }

    /// Scope the token to a tenant.
    #[inline]
    pub fn with_tenant<S: Into<String>>(mut self, tenant_id: S) -> Self {
        self.set_tenant(tenant_id);
        self
    }

    /// User name.
    #[inline]
    pub fn user(&self) -> &str {
        match self.inner.body().auth.credentials {
            protocol::Credentials::ApiKey(ref key) => &key.username,
            protocol::Credentials::Password(ref pw) => &pw.username,
        }
    }
}

#[async_trait]
impl AuthType for ApiKey {
    /// Add the token to the request.
    async fn authenticate(
        &self,
        client: &Client,
        request: RequestBuilder,
    ) -> Result<RequestBuilder, Error> {
        self.inner.authenticate(client, request).await
    }

    /// Get a URL for the requested service.
    async fn get_endpoint(
        &self,
        client: &Client,
        service_type: &str,
        filters: &EndpointFilters,
    ) -> Result<Url, Error> {
        self.inner.get_endpoint(client, service_type, filters).await
    }

    /// Refresh the cached token and service catalog.
    async fn refresh(&self, client: &Client) -> Result<(), Error> {
        self.inner.refresh(client, true).await
    }
}
