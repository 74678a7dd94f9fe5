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

//! JSON structures of the next generation Cloud Servers API.

#![allow(missing_docs)]

use std::collections::HashMap;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::pagination::MARKER_PARAMETER;
use crate::{Error, ErrorKind};

/// A link to a related resource.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub rel: String,
}

/// Extract the marker of the `next` link, if any.
///
/// Relative links are resolved against `base`. A `next` link that cannot be parsed or has no
/// marker is an error.
pub fn next_marker(base: &Url, links: &[Link]) -> Result<Option<String>, Error> {
    let next = match links.iter().find(|link| link.rel == "next") {
        Some(next) => next,
        None => return Ok(None),
    };
    let url = base.join(&next.href).map_err(|e| {
        Error::new(
            ErrorKind::InvalidResponse,
            format!("Invalid next link {}: {}", next.href, e),
        )
    })?;
    url.query_pairs()
        .find(|(key, _)| key == MARKER_PARAMETER)
        .map(|(_, value)| Some(value.into_owned()))
        .ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidResponse,
                format!("Next link {} has no {} parameter", next.href, MARKER_PARAMETER),
            )
        })
}

/// A listing envelope: one page of items and its links.
pub trait Listing: DeserializeOwned {
    type Item;

    fn into_parts(self) -> (Vec<Self::Item>, Vec<Link>);
}

/// A reference to another resource by ID.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Ref {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

/// A server size template.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Flavor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub ram: Option<u64>,
    #[serde(default)]
    pub disk: Option<u64>,
    #[serde(default)]
    pub vcpus: Option<u32>,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlavorsRoot {
    pub flavors: Vec<Flavor>,
    #[serde(default)]
    pub flavors_links: Vec<Link>,
}

impl Listing for FlavorsRoot {
    type Item = Flavor;

    fn into_parts(self) -> (Vec<Flavor>, Vec<Link>) {
        (self.flavors, self.flavors_links)
    }
}

/// An image servers can be built from.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Image {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default, rename = "minDisk")]
    pub min_disk: Option<u64>,
    #[serde(default, rename = "minRam")]
    pub min_ram: Option<u64>,
    #[serde(default)]
    pub progress: Option<u32>,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImagesRoot {
    pub images: Vec<Image>,
    #[serde(default)]
    pub images_links: Vec<Link>,
}

impl Listing for ImagesRoot {
    type Item = Image;

    fn into_parts(self) -> (Vec<Image>, Vec<Link>) {
        (self.images, self.images_links)
    }
}

/// An address of a server on one of its networks.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Address {
    pub addr: String,
    pub version: u8,
}

/// A server.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Server {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub progress: Option<u32>,
    #[serde(default, rename = "accessIPv4")]
    pub access_ipv4: Option<String>,
    #[serde(default, rename = "accessIPv6")]
    pub access_ipv6: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub flavor: Option<Ref>,
    /// Empty for servers booted from a volume.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub image: Option<Ref>,
    #[serde(default, rename = "hostId")]
    pub host_id: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub addresses: HashMap<String, Vec<Address>>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServersRoot {
    pub servers: Vec<Server>,
    #[serde(default)]
    pub servers_links: Vec<Link>,
}

impl Listing for ServersRoot {
    type Item = Server;

    fn into_parts(self) -> (Vec<Server>, Vec<Link>) {
        (self.servers, self.servers_links)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerRoot {
    pub server: Server,
}

/// A file injected into a new server.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Personality {
    pub path: String,
    /// Base64 encoded content.
    pub contents: String,
}

/// A network to attach a new server to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Network {
    pub uuid: String,
}

/// Request and response of server creation.
///
/// If `admin_pass` is not set in the request, the server generates one and returns it in the
/// response. This is the only time the password is available: it cannot be retrieved later.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct NewServer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "imageRef", skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    #[serde(default, rename = "flavorRef", skip_serializing_if = "Option::is_none")]
    pub flavor_ref: Option<String>,
    #[serde(default, rename = "adminPass", skip_serializing_if = "Option::is_none")]
    pub admin_pass: Option<String>,
    #[serde(
        default,
        rename = "OS-DCF:diskConfig",
        skip_serializing_if = "Option::is_none"
    )]
    pub disk_config: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub personality: Vec<Personality>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<Network>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

impl NewServer {
    /// Request for a server with the given name, image and flavor.
    pub fn new<S1, S2, S3>(name: S1, image_ref: S2, flavor_ref: S3) -> NewServer
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        NewServer {
            name: Some(name.into()),
            image_ref: Some(image_ref.into()),
            flavor_ref: Some(flavor_ref.into()),
            ..NewServer::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewServerRoot {
    pub server: NewServer,
}

fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OrEmpty<T> {
        Value(T),
        Empty(String),
    }

    match Option::<OrEmpty<T>>::deserialize(deserializer)? {
        Some(OrEmpty::Value(value)) => Ok(Some(value)),
        Some(OrEmpty::Empty(ref s)) if s.is_empty() => Ok(None),
        Some(OrEmpty::Empty(s)) => Err(serde::de::Error::custom(format!(
            "expected a reference, got string {:?}",
            s
        ))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn base() -> Url {
        Url::parse("https://dfw.servers.api.rackspacecloud.com/v2/123456/servers").unwrap()
    }

    fn next(href: &str) -> Vec<Link> {
        vec![Link {
            href: href.into(),
            rel: "next".into(),
        }]
    }

    #[test]
    fn test_next_marker() {
        let links =
            next("https://dfw.servers.api.rackspacecloud.com/v2/123456/servers?limit=2&marker=abc%20d");
        assert_eq!(
            next_marker(&base(), &links).unwrap().as_deref(),
            Some("abc d")
        );
        assert_eq!(next_marker(&base(), &[]).unwrap(), None);
    }

    #[test]
    fn test_next_marker_relative() {
        let links = next("/v2/123456/servers?marker=s1");
        assert_eq!(next_marker(&base(), &links).unwrap().as_deref(), Some("s1"));
    }

    #[test]
    fn test_next_marker_ignores_other_links() {
        let links = vec![Link {
            href: "https://dfw.servers.api.rackspacecloud.com/v2/123456/servers?marker=abc".into(),
            rel: "self".into(),
        }];
        assert_eq!(next_marker(&base(), &links).unwrap(), None);
    }

    #[test]
    fn test_next_marker_without_marker() {
        let links = next("/v2/123456/servers?limit=2");
        let err = next_marker(&base(), &links).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    }

    #[test]
    fn test_next_marker_unparseable() {
        let links = next("http://[::1/servers?marker=s1");
        let err = next_marker(&base(), &links).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    }

    #[test]
    fn test_servers_page() {
        let root: ServersRoot = serde_json::from_value(json!({
            "servers": [
                {"id": "s1", "name": "web01", "links": []},
                {"id": "s2", "name": "web02", "links": []}
            ],
            "servers_links": [
                {"rel": "next", "href": "http://127.0.0.1/v2/123456/servers?marker=s2"}
            ]
        }))
        .unwrap();
        let (servers, links) = root.into_parts();
        assert_eq!(servers.len(), 2);
        assert_eq!(
            next_marker(&base(), &links).unwrap().as_deref(),
            Some("s2")
        );
    }

    #[test]
    fn test_server_booted_from_volume() {
        let root: ServersRoot = serde_json::from_value(json!({
            "servers": [
                {"id": "s1", "name": "bfv01", "image": "", "flavor": {"id": "general1-1"}},
                {"id": "s2", "name": "bfv02", "image": null},
                {"id": "s3", "name": "web01", "image": {"id": "img-1"}}
            ]
        }))
        .unwrap();
        let images: Vec<_> = root.servers.iter().map(|s| s.image.clone()).collect();
        assert_eq!(images[0], None);
        assert_eq!(images[1], None);
        assert_eq!(images[2].as_ref().map(|r| r.id.as_str()), Some("img-1"));
    }

    #[test]
    fn test_server_image_bad_string() {
        let result: Result<Server, _> =
            serde_json::from_value(json!({"id": "s1", "name": "web01", "image": "img-1"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_new_server_serialize() {
        let ns = NewServer::new("web01", "img-1", "2");
        let value = serde_json::to_value(NewServerRoot { server: ns }).unwrap();
        assert_eq!(
            value,
            json!({"server": {"name": "web01", "imageRef": "img-1", "flavorRef": "2"}})
        );
    }
}
