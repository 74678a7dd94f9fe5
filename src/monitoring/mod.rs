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

//! Cloud Monitoring API.
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), raxcloud::Error> {
//! let session = raxcloud::from_env()?;
//! let monitoring = session.monitoring().await?;
//! for entity in monitoring.list_entities().await? {
//!     println!("{} {:?}", entity.id, entity.label);
//! }
//! # Ok(()) }
//! ```

use log::debug;
use reqwest::{Client, IntoUrl, StatusCode, Url};

use super::client::AuthenticatedClient;
use super::identity::{ApiKey, Password, DEFAULT_AUTH_URL};
use super::pagination::Paginator;
use super::{url, Error};

pub mod protocol;

pub use self::protocol::{
    AgentTargets, Check, Entity, HostInfo, HostInfoReport, HostInfoType, Metadata, PaginatedList,
};

/// Client for one Cloud Monitoring tenant.
#[derive(Debug, Clone)]
pub struct MonitoringClient {
    client: AuthenticatedClient,
    endpoint: Url,
}

impl MonitoringClient {
    /// Create a client for the given monitoring endpoint.
    pub fn new(client: AuthenticatedClient, endpoint: Url) -> MonitoringClient {
        MonitoringClient { client, endpoint }
    }

    /// Create a client authenticating with a user name and a password.
    ///
    /// `auth_url` defaults to the public Rackspace identity service. The first request
    /// authenticates.
    pub fn with_password<U, S1, S2>(
        endpoint: U,
        auth_url: Option<&str>,
        user_name: S1,
        password: S2,
    ) -> Result<MonitoringClient, Error>
    where
        U: IntoUrl,
        S1: Into<String>,
        S2: Into<String>,
    {
        let auth = Password::new(auth_url.unwrap_or(DEFAULT_AUTH_URL), user_name, password)?;
        Ok(MonitoringClient::new(
            AuthenticatedClient::new_lazy(Client::new(), auth),
            endpoint.into_url()?,
        ))
    }

    /// Create a client authenticating with a user name and an API key.
    ///
    /// `auth_url` defaults to the public Rackspace identity service. The first request
    /// authenticates.
    pub fn with_api_key<U, S1, S2>(
        endpoint: U,
        auth_url: Option<&str>,
        user_name: S1,
        api_key: S2,
    ) -> Result<MonitoringClient, Error>
    where
        U: IntoUrl,
        S1: Into<String>,
        S2: Into<String>,
    {
        let auth = ApiKey::new(auth_url.unwrap_or(DEFAULT_AUTH_URL), user_name, api_key)?;
        Ok(MonitoringClient::new(
            AuthenticatedClient::new_lazy(Client::new(), auth),
            endpoint.into_url()?,
        ))
    }

    /// Base URL of the monitoring API.
    #[inline]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Underlying authenticated client.
    #[inline]
    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    fn url<I>(&self, segments: I) -> Result<Url, Error>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        url::extend(self.endpoint.clone(), segments)
    }

    /// Prepare listing entities page by page.
    pub fn entities(&self) -> Result<Paginator<Entity>, Error> {
        self.client
            .get(self.url(&["entities"])?)
            .expect_status(StatusCode::OK)
            .fetch_paginated()
    }

    /// List all entities.
    pub async fn list_entities(&self) -> Result<Vec<Entity>, Error> {
        self.entities()?.fetch_all().await
    }

    /// Get one entity.
    pub async fn get_entity<S: AsRef<str>>(&self, entity_id: S) -> Result<Entity, Error> {
        self.client
            .get(self.url(&["entities", entity_id.as_ref()])?)
            .expect_status(StatusCode::OK)
            .fetch_json()
            .await
    }

    /// Delete an entity.
    pub async fn delete_entity<S: AsRef<str>>(&self, entity_id: S) -> Result<(), Error> {
        debug!("Deleting entity {}", entity_id.as_ref());
        let _ = self
            .client
            .delete(self.url(&["entities", entity_id.as_ref()])?)
            .expect_statuses(vec![StatusCode::OK, StatusCode::NO_CONTENT])
            .send()
            .await?;
        Ok(())
    }

    /// Prepare listing checks of an entity page by page.
    pub fn checks<S: AsRef<str>>(&self, entity_id: S) -> Result<Paginator<Check>, Error> {
        self.client
            .get(self.url(&["entities", entity_id.as_ref(), "checks"])?)
            .expect_status(StatusCode::OK)
            .fetch_paginated()
    }

    /// List all checks of an entity.
    pub async fn list_checks<S: AsRef<str>>(&self, entity_id: S) -> Result<Vec<Check>, Error> {
        self.checks(entity_id)?.fetch_all().await
    }

    /// Get host information collected by the agent of an entity.
    pub async fn host_info<S: AsRef<str>>(
        &self,
        entity_id: S,
        info_type: HostInfoType,
    ) -> Result<HostInfoReport, Error> {
        let body = self
            .client
            .get(self.url(&[
                "entities",
                entity_id.as_ref(),
                "agent",
                "host_info",
                info_type.as_str(),
            ])?)
            .expect_status(StatusCode::OK)
            .send()
            .await?
            .bytes()
            .await?;
        HostInfo::decode(info_type, &body)
    }

    /// Get host information by the name of its type (e.g. `cpus`).
    ///
    /// Fails with `InvalidInput` without sending a request if the type is not known.
    pub async fn host_info_by_name<S: AsRef<str>>(
        &self,
        entity_id: S,
        info_type: &str,
    ) -> Result<HostInfoReport, Error> {
        let info_type = info_type.parse()?;
        self.host_info(entity_id, info_type).await
    }

    /// List targets available to an agent check type (e.g. `agent.filesystem`).
    pub async fn agent_targets<S1, S2>(
        &self,
        entity_id: S1,
        agent_type: S2,
    ) -> Result<AgentTargets, Error>
    where
        S1: AsRef<str>,
        S2: AsRef<str>,
    {
        self.client
            .get(self.url(&[
                "entities",
                entity_id.as_ref(),
                "agent",
                "check_types",
                agent_type.as_ref(),
                "targets",
            ])?)
            .expect_status(StatusCode::OK)
            .fetch_json()
            .await
    }
}

#[cfg(test)]
mod test {
    use reqwest::{Client, Url};
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{HostInfo, HostInfoType, MonitoringClient};
    use crate::client::AuthenticatedClient;
    use crate::{ErrorKind, StaticToken};

    fn monitoring(server: &MockServer) -> MonitoringClient {
        let endpoint = Url::parse(&format!("{}/v1.0/123456", server.uri())).unwrap();
        let auth = StaticToken::new(endpoint.clone(), "abcdef").unwrap();
        MonitoringClient::new(AuthenticatedClient::new_lazy(Client::new(), auth), endpoint)
    }

    fn entity_page(ids: &[&str], next_marker: Option<&str>) -> serde_json::Value {
        json!({
            "values": ids.iter().map(|id| json!({"id": id, "label": id})).collect::<Vec<_>>(),
            "metadata": {
                "count": ids.len(),
                "limit": 2,
                "marker": null,
                "next_marker": next_marker,
                "next_href": null
            }
        })
    }

    #[tokio::test]
    async fn test_list_entities() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.0/123456/entities"))
            .and(query_param_is_missing("marker"))
            .and(header("x-auth-token", "abcdef"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(entity_page(&["en1", "en2"], Some("en3"))),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1.0/123456/entities"))
            .and(query_param("marker", "en3"))
            .and(header("x-auth-token", "abcdef"))
            .respond_with(ResponseTemplate::new(200).set_body_json(entity_page(&["en3"], None)))
            .expect(1)
            .mount(&server)
            .await;

        let entities = monitoring(&server).list_entities().await.unwrap();
        let ids: Vec<_> = entities.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["en1", "en2", "en3"]);
    }

    #[tokio::test]
    async fn test_list_checks_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.0/123456/entities/en1/checks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "values": [],
                "metadata": {"count": 0, "limit": 100, "marker": null, "next_marker": null}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let checks = monitoring(&server).list_checks("en1").await.unwrap();
        assert!(checks.is_empty());
    }

    #[tokio::test]
    async fn test_list_checks_failure_midway() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.0/123456/entities/en1/checks"))
            .and(query_param_is_missing("marker"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "values": [{"id": "ch1", "type": "remote.ping"}],
                "metadata": {"next_marker": "ch2"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1.0/123456/entities/en1/checks"))
            .and(query_param("marker", "ch2"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let err = monitoring(&server).list_checks("en1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedStatus);
    }

    #[tokio::test]
    async fn test_get_entity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.0/123456/entities/en1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "en1",
                "label": "web01",
                "agent_id": "web01",
                "ip_addresses": {"private0_v4": "10.0.0.2"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let entity = monitoring(&server).get_entity("en1").await.unwrap();
        assert_eq!(entity.agent_id.as_deref(), Some("web01"));
        assert_eq!(entity.ip_addresses["private0_v4"], "10.0.0.2");
    }

    #[tokio::test]
    async fn test_get_entity_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.0/123456/entities/enXXX"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "type": "notFoundError",
                "code": 404,
                "message": "Object does not exist"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = monitoring(&server).get_entity("enXXX").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
    }

    #[tokio::test]
    async fn test_delete_entity() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1.0/123456/entities/en1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        monitoring(&server).delete_entity("en1").await.unwrap();
    }

    #[tokio::test]
    async fn test_host_info() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.0/123456/entities/en1/agent/host_info/filesystems"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "timestamp": 1372887283468i64,
                "info": [
                    {"dir_name": "/", "dev_name": "/dev/xvda1", "sys_type_name": "ext4",
                     "total": 20000, "free": 15000, "used": 5000, "avail": 14000}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let report = monitoring(&server)
            .host_info_by_name("en1", "filesystems")
            .await
            .unwrap();
        match report.info {
            HostInfo::Filesystems(fs) => {
                assert_eq!(fs.len(), 1);
                assert_eq!(fs[0].dir_name, "/");
                assert_eq!(fs[0].avail, Some(14000));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_host_info_processes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.0/123456/entities/en1/agent/host_info/processes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "info": [{"pid": 1, "exe_name": "init", "state_name": "S"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let report = monitoring(&server)
            .host_info("en1", HostInfoType::Processes)
            .await
            .unwrap();
        assert_eq!(report.timestamp, None);
        assert_eq!(report.info.info_type(), HostInfoType::Processes);
    }

    #[tokio::test]
    async fn test_host_info_unknown_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = monitoring(&server)
            .host_info_by_name("en1", "gpus")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_agent_targets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/v1.0/123456/entities/en1/agent/check_types/agent.filesystem/targets",
            ))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"targets": ["/", "/boot"]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let targets = monitoring(&server)
            .agent_targets("en1", "agent.filesystem")
            .await
            .unwrap();
        assert_eq!(targets.targets, vec!["/", "/boot"]);
    }

    #[test]
    fn test_with_api_key() {
        let client = MonitoringClient::with_api_key(
            "https://monitoring.api.rackspacecloud.com/v1.0/123456",
            None,
            "user",
            "key",
        )
        .unwrap();
        assert_eq!(client.endpoint().path(), "/v1.0/123456");
    }
}
