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

//! Session structure definition.

use log::debug;
use reqwest::{Client, Url};

use super::client::AuthenticatedClient;
use super::compute::Region;
use super::monitoring::MonitoringClient;
use super::services::{ServiceType, COMPUTE, MONITORING};
use super::{AuthType, EndpointFilters, Error, InterfaceType};

/// A Rackspace cloud session.
///
/// The session object serves as a wrapper around an [authentication type](trait.AuthType.html),
/// resolving service endpoints and producing service clients.
///
/// # Note
///
/// All clones of one session share the same authentication. Use
/// [with_auth_type](#method.with_auth_type) to detach a session.
#[derive(Debug, Clone)]
pub struct Session {
    client: AuthenticatedClient,
    endpoint_filters: EndpointFilters,
}

impl Session {
    /// Create a new session with a given authentication plugin.
    ///
    /// The resulting session will use the default endpoint interface (public). Nothing is
    /// requested until the first call that needs a token.
    pub fn new<Auth: AuthType + 'static>(auth_type: Auth) -> Session {
        Session::new_with_client(Client::new(), auth_type)
    }

    /// Create a new session with a given HTTP client and authentication plugin.
    ///
    /// Timeouts, proxies and TLS settings of `client` apply to all requests of the session.
    pub fn new_with_client<Auth: AuthType + 'static>(client: Client, auth_type: Auth) -> Session {
        Session::from(AuthenticatedClient::new_lazy(client, auth_type))
    }

    /// Get a reference to the authentication type in use.
    #[inline]
    pub fn auth_type(&self) -> &dyn AuthType {
        self.client.auth_type()
    }

    /// Get a reference to the authenticated client in use.
    #[inline]
    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    /// Endpoint filters in use.
    #[inline]
    pub fn endpoint_filters(&self) -> &EndpointFilters {
        &self.endpoint_filters
    }

    /// Modify endpoint filters.
    #[inline]
    pub fn endpoint_filters_mut(&mut self) -> &mut EndpointFilters {
        &mut self.endpoint_filters
    }

    /// Update the authentication.
    ///
    /// # Warning
    ///
    /// Authentication will also be updated for clones of this `Session`, since they share the same
    /// authentication object.
    #[inline]
    pub async fn refresh(&mut self) -> Result<(), Error> {
        self.client.refresh().await
    }

    /// Set a new authentication for this `Session`.
    ///
    /// It does not affect clones of this `Session`.
    #[inline]
    pub fn set_auth_type<Auth: AuthType + 'static>(&mut self, auth_type: Auth) {
        self.client.set_auth_type(auth_type);
    }

    /// Set endpoint interface to use.
    #[inline]
    pub fn set_endpoint_interface(&mut self, endpoint_interface: InterfaceType) {
        self.endpoint_filters.set_interface(endpoint_interface);
    }

    /// Set region to use.
    #[inline]
    pub fn set_region<S: Into<String>>(&mut self, region: S) {
        self.endpoint_filters.set_region(region);
    }

    /// Convert this session into one using the given authentication.
    #[inline]
    pub fn with_auth_type<Auth: AuthType + 'static>(mut self, auth_method: Auth) -> Session {
        self.set_auth_type(auth_method);
        self
    }

    /// Convert this session into one using the given endpoint filters.
    #[inline]
    pub fn with_endpoint_filters(mut self, endpoint_filters: EndpointFilters) -> Session {
        self.endpoint_filters = endpoint_filters;
        self
    }

    /// Convert this session into one using the given endpoint interface.
    #[inline]
    pub fn with_endpoint_interface(mut self, endpoint_interface: InterfaceType) -> Session {
        self.set_endpoint_interface(endpoint_interface);
        self
    }

    /// Convert this session into one using the given region.
    #[inline]
    pub fn with_region<S: Into<String>>(mut self, region: S) -> Session {
        self.set_region(region);
        self
    }

    /// Get the base URL of the given service.
    ///
    /// Authenticates if needed.
    pub async fn get_endpoint<Srv: ServiceType + Send>(&self, service: Srv) -> Result<Url, Error> {
        let endpoint = self
            .client
            .get_endpoint(service.catalog_type(), &self.endpoint_filters)
            .await?;
        debug!(
            "Using {} for service {}",
            endpoint,
            service.catalog_type()
        );
        Ok(endpoint)
    }

    /// Create a Cloud Monitoring client.
    ///
    /// ```rust,no_run
    /// # async fn example() -> Result<(), raxcloud::Error> {
    /// let session = raxcloud::from_env()?;
    /// let monitoring = session.monitoring().await?;
    /// let checks = monitoring.list_checks("enAAAAA").await?;
    /// # Ok(()) }
    /// ```
    pub async fn monitoring(&self) -> Result<MonitoringClient, Error> {
        let endpoint = self.get_endpoint(MONITORING).await?;
        Ok(MonitoringClient::new(self.client.clone(), endpoint))
    }

    /// Create a Cloud Servers client for the region of this session.
    ///
    /// ```rust,no_run
    /// # async fn example() -> Result<(), raxcloud::Error> {
    /// let session = raxcloud::from_env()?.with_region("ORD");
    /// let region = session.compute().await?;
    /// let flavors = region.list_flavors().await?;
    /// # Ok(()) }
    /// ```
    pub async fn compute(&self) -> Result<Region, Error> {
        let endpoint = self.get_endpoint(COMPUTE).await?;
        Ok(Region::new(self.client.clone(), endpoint))
    }
}

impl From<AuthenticatedClient> for Session {
    fn from(value: AuthenticatedClient) -> Session {
        Session {
            client: value,
            endpoint_filters: EndpointFilters::default(),
        }
    }
}
