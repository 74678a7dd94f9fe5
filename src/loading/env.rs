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

//! Support for `RAX_` environment variables.

use std::env;

use super::CloudOptions;
use crate::loading;
use crate::{Error, ErrorKind, Session};

// This is only used for unit testing.
trait Environment {
    fn get(&self, name: &'static str) -> Option<String>;
}

#[derive(Debug, Clone, Copy)]
struct RealEnvironment;

impl Environment for RealEnvironment {
    fn get(&self, name: &'static str) -> Option<String> {
        env::var(name).ok()
    }
}

fn _from_env<E: Environment>(env: E) -> Result<Session, Error> {
    if let Some(cloud_name) = env.get("RAX_CLOUD") {
        return loading::from_config(cloud_name);
    }

    let options = CloudOptions {
        auth_type: env.get("RAX_AUTH_TYPE"),
        auth_url: env.get("RAX_AUTH_URL"),
        username: env.get("RAX_USERNAME"),
        password: env.get("RAX_PASSWORD"),
        api_key: env.get("RAX_API_KEY"),
        tenant_id: env.get("RAX_TENANT_ID"),
        token: env.get("RAX_TOKEN"),
        endpoint: env.get("RAX_ENDPOINT"),
        region: env.get("RAX_REGION"),
        interface: env.get("RAX_INTERFACE"),
        cacert: env.get("RAX_CACERT"),
    };
    loading::create_session(options, ErrorKind::InvalidInput)
}

/// Create a `Session` from environment variables.
///
/// If `RAX_CLOUD` is set, the session is loaded from `clouds.yaml` instead.
/// Otherwise the authentication type is `RAX_AUTH_TYPE` or guessed from the variables present:
///
/// * `token`: `RAX_TOKEN` and `RAX_ENDPOINT`,
/// * `api_key`: `RAX_USERNAME` and `RAX_API_KEY`,
/// * `password`: `RAX_USERNAME`, `RAX_PASSWORD` and optionally `RAX_TENANT_ID`,
/// * `none`: optionally `RAX_ENDPOINT`.
///
/// `RAX_AUTH_URL` defaults to the public Rackspace identity service. `RAX_REGION`,
/// `RAX_INTERFACE` (`public` or `internal`) and `RAX_CACERT` apply to all types.
pub fn from_env() -> Result<Session, Error> {
    _from_env(RealEnvironment)
}
