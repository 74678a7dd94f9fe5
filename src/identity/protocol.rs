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

//! Identity API v2.0 JSON structures.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// User name and password.
#[derive(Clone, Deserialize, Serialize)]
pub struct PasswordCredentials {
    /// User name.
    pub username: String,
    /// Password.
    pub password: String,
}

/// User name and API key.
#[derive(Clone, Deserialize, Serialize)]
pub struct ApiKeyCredentials {
    /// User name.
    pub username: String,
    /// API key.
    #[serde(rename = "apiKey")]
    pub api_key: String,
}

/// Authentication credentials.
#[derive(Clone, Debug)]
pub enum Credentials {
    /// Password authentication.
    Password(PasswordCredentials),
    /// API key authentication.
    ApiKey(ApiKeyCredentials),
}

/// An authentication object.
#[derive(Clone, Debug)]
pub struct Auth {
    /// Credentials to use.
    pub credentials: Credentials,
    /// Tenant to scope to (if any).
    pub tenant_id: Option<String>,
}

/// An authentication request root.
#[derive(Clone, Debug, Serialize)]
pub struct AuthRoot {
    /// Authentication object.
    pub auth: Auth,
}

/// A tenant the token is scoped to.
#[derive(Clone, Debug, Deserialize)]
pub struct Tenant {
    /// Tenant ID.
    pub id: String,
    /// Tenant name.
    #[serde(default)]
    pub name: Option<String>,
}

/// An issued token.
#[derive(Clone, Debug, Deserialize)]
pub struct Token {
    /// Token value.
    pub id: String,
    /// Expiration time.
    pub expires: DateTime<FixedOffset>,
    /// Tenant the token belongs to.
    #[serde(default)]
    pub tenant: Option<Tenant>,
}

/// A single endpoint of a service.
#[derive(Clone, Debug, Deserialize)]
pub struct Endpoint {
    /// Region of the endpoint (global services have none).
    #[serde(default)]
    pub region: Option<String>,
    /// Tenant ID baked into the URLs.
    #[serde(rename = "tenantId", default)]
    pub tenant_id: Option<String>,
    /// Public URL.
    #[serde(rename = "publicURL")]
    pub public_url: String,
    /// Internal (ServiceNet) URL.
    #[serde(rename = "internalURL", default)]
    pub internal_url: Option<String>,
}

/// A service catalog record.
#[derive(Clone, Debug, Deserialize)]
pub struct CatalogRecord {
    /// Service name, e.g. `cloudServersOpenStack`.
    pub name: String,
    /// Service type, e.g. `compute`.
    #[serde(rename = "type")]
    pub service_type: String,
    /// Service endpoints.
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

/// Authentication response body.
#[derive(Clone, Debug, Deserialize)]
pub struct Access {
    /// The token.
    pub token: Token,
    /// Service catalog.
    #[serde(rename = "serviceCatalog", default)]
    pub catalog: Vec<CatalogRecord>,
}

/// Authentication response root.
#[derive(Clone, Debug, Deserialize)]
pub struct AccessRoot {
    /// Access object.
    pub access: Access,
}

impl fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl fmt::Debug for ApiKeyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ApiKeyCredentials")
            .field("username", &self.username)
            .field("api_key", &"***")
            .finish()
    }
}

impl Serialize for Auth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = if self.tenant_id.is_some() { 2 } else { 1 };
        let mut auth = serializer.serialize_struct("Auth", len)?;
        match self.credentials {
            Credentials::Password(ref pw) => auth.serialize_field("passwordCredentials", pw)?,
            Credentials::ApiKey(ref key) => {
                auth.serialize_field("RAX-KSKEY:apiKeyCredentials", key)?
            }
        }
        if let Some(ref tenant_id) = self.tenant_id {
            auth.serialize_field("tenantId", tenant_id)?;
        }
        auth.end()
    }
}
