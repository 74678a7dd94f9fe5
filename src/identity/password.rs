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

//! Password authentication.

use async_trait::async_trait;
use reqwest::{Client, IntoUrl, RequestBuilder, Url};

use super::internal::Internal;
use super::protocol;
use super::Identity;
use crate::{AuthType, EndpointFilters, Error, InterfaceType};

/// Password authentication using Identity API v2.0.
///
/// You need to know `auth_url`, which is an authentication endpoint of the Identity service,
/// the user name and the password:
///
/// ```rust,no_run
/// let auth = raxcloud::identity::Password::new(
///     raxcloud::identity::DEFAULT_AUTH_URL,
///     "admin",
///     "pa$$w0rd",
/// )
/// .expect("Invalid auth_url")
/// .with_region("DFW");
///
/// let session = raxcloud::Session::new(auth);
/// ```
///
/// The authentication token is cached while it's still valid or until
/// [refresh](../trait.AuthType.html#tymethod.refresh) is called.
/// Clones of a `Password` start with an empty cache.
#[derive(Debug, Clone)]
pub struct Password {
    inner: Internal,
}

impl Identity for Password {
    fn auth_url(&self) -> &Url {
        self.inner.auth_url()
    }
}

impl Password {
    /// Create a password authentication.
    pub fn new<U, S1, S2>(auth_url: U, user_name: S1, password: S2) -> Result<Password, Error>
    where
        U: IntoUrl,
        S1: Into<String>,
        S2: Into<String>,
    {
        let auth_url = auth_url.into_url()?;
        let body = protocol::AuthRoot {
            auth: protocol::Auth {
                credentials: protocol::Credentials::Password(protocol::PasswordCredentials {
                    username: user_name.into(),
                    password: password.into(),
                }),
                tenant_id: None,
            },
        };
        Ok(Password {
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
            protocol::Credentials::Password(ref pw) => &pw.username,
            protocol::Credentials::ApiKey(ref key) => &key.username,
        }
    }

    /// Tenant ID of the current token.
    ///
    /// Authenticates if needed.
    #[inline]
    pub async fn tenant_id(&self, client: &Client) -> Result<Option<String>, Error> {
        self.inner.tenant_id(client).await
    }
}

#[async_trait]
impl AuthType for Password {
    /// Add the token to the request.
    async fn authenticate(
        &self,
        client: &Client,
        request: RequestBuilder,
    ) -> Result<RequestBuilder, Error> {
        self.inner.authenticate(client, request).await
    }

    /// Get a URL for the requested service.
    ///
    /// Filters without a region fall back to the region of this authentication.
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
