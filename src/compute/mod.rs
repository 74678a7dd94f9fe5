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

//! Next generation Cloud Servers in one region.

use log::debug;
use reqwest::{StatusCode, Url};

use super::client::AuthenticatedClient;
use super::pagination::{Page, Paginator};
use super::{url, Error, ErrorKind};

pub mod protocol;

use self::protocol::Listing;
pub use self::protocol::{Flavor, Image, Link, NewServer, Server};

/// Logical endpoint names a region supports.
pub const SUPPORTED_ENDPOINTS: [&str; 3] = ["images", "flavors", "servers"];

/// Client for the servers of one region.
#[derive(Debug, Clone)]
pub struct Region {
    client: AuthenticatedClient,
    endpoint: Url,
}

impl Region {
    /// Create a client for the given regional endpoint.
    pub fn new(client: AuthenticatedClient, endpoint: Url) -> Region {
        Region { client, endpoint }
    }

    /// Public URL of the region.
    #[inline]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Underlying authenticated client.
    #[inline]
    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    /// URL of a logical endpoint (`images`, `flavors` or `servers`).
    ///
    /// Fails with `UnsupportedEndpoint` for any other name.
    pub fn endpoint_by_name(&self, name: &str) -> Result<Url, Error> {
        if SUPPORTED_ENDPOINTS.contains(&name) {
            url::extend(self.endpoint.clone(), &[name])
        } else {
            Err(Error::new(
                ErrorKind::UnsupportedEndpoint,
                format!("Unsupported endpoint {}", name),
            ))
        }
    }

    fn paginated<R>(&self, name: &str) -> Result<Paginator<R::Item>, Error>
    where
        R: Listing + 'static,
    {
        let url = self.endpoint_by_name(name)?;
        let base = url.clone();
        self.client
            .get(url)
            .expect_status(StatusCode::OK)
            .fetch_paginated_with(move |body: &[u8]| {
                let root: R = serde_json::from_slice(body)?;
                let (items, links) = root.into_parts();
                Ok(Page::new(items, protocol::next_marker(&base, &links)?))
            })
    }

    /// Prepare listing flavors page by page.
    pub fn flavors(&self) -> Result<Paginator<Flavor>, Error> {
        self.paginated::<protocol::FlavorsRoot>("flavors")
    }

    /// List all flavors available in the region.
    pub async fn list_flavors(&self) -> Result<Vec<Flavor>, Error> {
        self.flavors()?.fetch_all().await
    }

    /// Prepare listing images page by page.
    pub fn images(&self) -> Result<Paginator<Image>, Error> {
        self.paginated::<protocol::ImagesRoot>("images")
    }

    /// List all images available in the region.
    pub async fn list_images(&self) -> Result<Vec<Image>, Error> {
        self.images()?.fetch_all().await
    }

    /// Prepare listing servers page by page.
    pub fn servers(&self) -> Result<Paginator<Server>, Error> {
        self.paginated::<protocol::ServersRoot>("servers")
    }

    /// List all servers of the tenant in the region.
    pub async fn list_servers(&self) -> Result<Vec<Server>, Error> {
        self.servers()?.fetch_all().await
    }

    /// Get a server by its ID.
    pub async fn server_by_id<S: AsRef<str>>(&self, id: S) -> Result<Server, Error> {
        let url = url::extend(self.endpoint_by_name("servers")?, &[id.as_ref()])?;
        let root: protocol::ServerRoot = self
            .client
            .get(url)
            .expect_status(StatusCode::OK)
            .fetch_json()
            .await?;
        Ok(root.server)
    }

    /// Request a new server.
    ///
    /// Provisioning is asynchronous. The result carries the ID of the new server and, unless the
    /// request set one, the generated `admin_pass`. The password is only ever returned here.
    pub async fn create_server(&self, new_server: NewServer) -> Result<NewServer, Error> {
        debug!("Creating server {:?}", new_server.name);
        let root: protocol::NewServerRoot = self
            .client
            .post(self.endpoint_by_name("servers")?)
            .json(&protocol::NewServerRoot { server: new_server })
            .expect_status(StatusCode::ACCEPTED)
            .fetch_json()
            .await?;
        debug!("Server {:?} accepted for creation", root.server.id);
        Ok(root.server)
    }

    /// Delete a server.
    pub async fn delete_server<S: AsRef<str>>(&self, id: S) -> Result<(), Error> {
        let url = url::extend(self.endpoint_by_name("servers")?, &[id.as_ref()])?;
        debug!("Deleting server {}", id.as_ref());
        let _ = self
            .client
            .delete(url)
            .expect_status(StatusCode::NO_CONTENT)
            .send()
            .await?;
        Ok(())
    }
}
