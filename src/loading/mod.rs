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

//! Support for loading sessions from external input.

#[cfg(any(feature = "native-tls", feature = "rustls"))]
use std::fs;
use std::str::FromStr;

use log::debug;
#[cfg(any(feature = "native-tls", feature = "rustls"))]
use reqwest::Certificate;
use reqwest::Client;

use crate::identity::{ApiKey, Password, DEFAULT_AUTH_URL};
use crate::{EndpointFilters, Error, ErrorKind, InterfaceType, NoAuth, Session, StaticToken};

/// Create an HTTP client with the provided CA certificate.
#[inline]
#[allow(unused_mut)] // mut builder unused with --no-default-features
fn get_client(cacert: Option<String>) -> Result<Client, Error> {
    let mut builder = Client::builder();
    #[cfg(any(feature = "native-tls", feature = "rustls"))]
    if let Some(cert_path) = cacert {
        let cert_content = fs::read(&cert_path).map_err(|e| {
            Error::new(
                ErrorKind::InvalidConfig,
                format!("Cannot open cacert file {}: {}", cert_path, e),
            )
        })?;

        let cert = Certificate::from_pem(&cert_content).map_err(|e| {
            Error::new(
                ErrorKind::InvalidConfig,
                format!("Cannot parse {} as PEM: {}", cert_path, e),
            )
        })?;

        builder = builder.add_root_certificate(cert);
    }

    #[cfg(not(any(feature = "native-tls", feature = "rustls")))]
    if cacert.is_some() {
        return Err(Error::new(
            ErrorKind::InvalidConfig,
            "TLS support is disabled",
        ));
    }

    builder.build().map_err(|e| {
        Error::new(
            ErrorKind::InvalidConfig,
            format!("Cannot initialize HTTP backend: {}", e),
        )
    })
}

/// Cloud settings collected from a configuration source.
#[derive(Debug, Default)]
struct CloudOptions {
    auth_type: Option<String>,
    auth_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    api_key: Option<String>,
    tenant_id: Option<String>,
    token: Option<String>,
    endpoint: Option<String>,
    region: Option<String>,
    interface: Option<String>,
    cacert: Option<String>,
}

impl CloudOptions {
    /// Authentication type, either explicit or guessed from the credentials present.
    fn auth_type(&self) -> &str {
        if let Some(ref value) = self.auth_type {
            value
        } else if self.token.is_some() {
            "token"
        } else if self.api_key.is_some() {
            "api_key"
        } else {
            "password"
        }
    }
}

fn require(value: Option<String>, what: &str, kind: ErrorKind) -> Result<String, Error> {
    value.ok_or_else(|| Error::new(kind, format!("{} is required", what)))
}

/// Create a session out of cloud settings.
///
/// `kind` is the error kind reported for missing or malformed settings.
fn create_session(options: CloudOptions, kind: ErrorKind) -> Result<Session, Error> {
    let auth_type = options.auth_type().to_string();
    debug!("Creating a session with {} authentication", auth_type);

    let mut filters = EndpointFilters::default();
    if let Some(ref interface) = options.interface {
        filters.set_interface(
            InterfaceType::from_str(interface).map_err(|e| Error::new(kind, e.to_string()))?,
        );
    }
    filters.region.clone_from(&options.region);

    let client = get_client(options.cacert)?;
    let auth_url = options
        .auth_url
        .unwrap_or_else(|| DEFAULT_AUTH_URL.to_string());

    let session = match auth_type.as_str() {
        "password" => {
            let username = require(options.username, "User name", kind)?;
            let password = require(options.password, "Password", kind)?;
            let mut id = Password::new(auth_url.as_str(), username, password)?;
            if let Some(tenant_id) = options.tenant_id {
                id.set_tenant(tenant_id);
            }
            Session::new_with_client(client, id)
        }
        "api_key" => {
            let username = require(options.username, "User name", kind)?;
            let api_key = require(options.api_key, "API key", kind)?;
            let mut id = ApiKey::new(auth_url.as_str(), username, api_key)?;
            if let Some(tenant_id) = options.tenant_id {
                id.set_tenant(tenant_id);
            }
            Session::new_with_client(client, id)
        }
        "token" => {
            let endpoint = require(options.endpoint, "Endpoint", kind)?;
            let token = require(options.token, "Token", kind)?;
            Session::new_with_client(client, StaticToken::new(endpoint.as_str(), token)?)
        }
        "none" => {
            let id = match options.endpoint {
                Some(endpoint) => NoAuth::new(endpoint)?,
                None => NoAuth::new_without_endpoint(),
            };
            Session::new_with_client(client, id)
        }
        other => {
            return Err(Error::new(
                kind,
                format!("Unsupported authentication type: {}", other),
            ))
        }
    };

    Ok(session.with_endpoint_filters(filters))
}

mod config;
mod env;

pub use config::from_config;
pub use env::from_env;
