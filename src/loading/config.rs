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

//! Support for cloud configuration file.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Deserialize;

use super::CloudOptions;
use crate::loading;
use crate::{Error, ErrorKind, Session};

#[derive(Debug, Default, Deserialize)]
struct Auth {
    #[serde(default)]
    auth_url: Option<String>,
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    tenant_id: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Cloud {
    #[serde(default)]
    auth: Option<Auth>,
    #[serde(default)]
    auth_type: Option<String>,
    #[serde(default)]
    cacert: Option<String>,
    #[serde(default)]
    region_name: Option<String>,
    #[serde(default)]
    interface: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Root {
    clouds: HashMap<String, Cloud>,
}

impl From<Cloud> for CloudOptions {
    fn from(value: Cloud) -> CloudOptions {
        let auth = value.auth.unwrap_or_default();
        CloudOptions {
            auth_type: value.auth_type,
            auth_url: auth.auth_url,
            username: auth.username,
            password: auth.password,
            api_key: auth.api_key,
            tenant_id: auth.tenant_id,
            token: auth.token,
            endpoint: auth.endpoint,
            region: value.region_name,
            interface: value.interface,
            cacert: value.cacert,
        }
    }
}

/// Merge two nested mappings. Values from `src` override values in `dest`.
fn merge_mappings(src: serde_yaml::Mapping, dest: &mut serde_yaml::Mapping) {
    for (src_key, src_value) in src {
        if let serde_yaml::Value::Mapping(src_mapping) = src_value {
            if let Some(dest_mapping) = dest.get_mut(&src_key).and_then(|v| v.as_mapping_mut()) {
                merge_mappings(src_mapping, dest_mapping);
                continue;
            }
            if dest.contains_key(&src_key) {
                warn!(
                    "Type mismatch while merging {:?}, overriding destination",
                    src_key
                );
            }
            let _ = dest.insert(src_key, serde_yaml::Value::Mapping(src_mapping));
        } else {
            let _ = dest.insert(src_key, src_value);
        }
    }
}

fn find_config<S: AsRef<str>>(filename: S) -> Option<PathBuf> {
    let filename = filename.as_ref();
    let current = Path::new(filename);
    if current.is_file() {
        match current.canonicalize() {
            Ok(val) => return Some(val),
            Err(e) => warn!("Cannot canonicalize {:?}: {}", current, e),
        }
    }

    if let Some(mut config) = dirs::config_dir() {
        config.push(format!("raxcloud/{}", filename));
        if config.is_file() {
            return Some(config);
        }
    } else {
        warn!("Cannot find configuration directory");
    }

    let abs = PathBuf::from(format!("/etc/raxcloud/{}", filename));
    if abs.is_file() {
        Some(abs)
    } else {
        None
    }
}

fn read_yaml(filename: &str, required: bool) -> Result<serde_yaml::Mapping, Error> {
    let path = match find_config(filename) {
        Some(path) => path,
        None if required => {
            return Err(Error::new(
                ErrorKind::InvalidConfig,
                format!("{} was not found in any location", filename),
            ))
        }
        None => return Ok(serde_yaml::Mapping::new()),
    };
    debug!("Reading cloud configuration from {:?}", path);

    let content = File::open(&path).map_err(|e| {
        Error::new(
            ErrorKind::InvalidConfig,
            format!("Cannot read {}: {}", path.display(), e),
        )
    })?;

    match serde_yaml::from_reader(content).map_err(|e| {
        Error::new(
            ErrorKind::InvalidConfig,
            format!("Cannot parse {}: {}", path.display(), e),
        )
    })? {
        serde_yaml::Value::Mapping(mapping) => Ok(mapping),
        other => Err(Error::new(
            ErrorKind::InvalidConfig,
            format!("Root of {} is {:?}, not a mapping", path.display(), other),
        )),
    }
}

fn from_files(
    name: &str,
    mut clouds: serde_yaml::Mapping,
    secure: serde_yaml::Mapping,
) -> Result<Session, Error> {
    merge_mappings(secure, &mut clouds);

    let mut root: Root = serde_yaml::from_value(serde_yaml::Value::Mapping(clouds)).map_err(|e| {
        Error::new(
            ErrorKind::InvalidConfig,
            format!("Cannot parse the merged cloud configuration: {}", e),
        )
    })?;

    let cloud = root
        .clouds
        .remove(name)
        .ok_or_else(|| Error::new(ErrorKind::InvalidConfig, format!("No such cloud: {}", name)))?;

    loading::create_session(cloud.into(), ErrorKind::InvalidConfig)
}

/// Create a `Session` from a `clouds.yaml` configuration file.
///
/// The file is searched in the current directory, then in `raxcloud` under the user
/// configuration directory (e.g. `~/.config/raxcloud`), then in `/etc/raxcloud`. Secrets may be
/// kept separately in `secure.yaml`, which is merged on top of `clouds.yaml`:
///
/// ```yaml
/// clouds:
///   rackspace:
///     auth:
///       username: admin
///       api_key: 0123456789abcdef
///     region_name: ORD
///     interface: internal
/// ```
pub fn from_config<S: AsRef<str>>(cloud_name: S) -> Result<Session, Error> {
    let clouds = read_yaml("clouds.yaml", true)?;
    let secure = read_yaml("secure.yaml", false)?;

    from_files(cloud_name.as_ref(), clouds, secure)
}

#[cfg(test)]
pub mod test {
    #[cfg(any(feature = "native-tls", feature = "rustls"))]
    use std::io::Write;

    use super::{find_config, from_files, merge_mappings, read_yaml};
    use crate::{ErrorKind, InterfaceType};

    fn to_yaml<S: AsRef<str>>(source: S) -> serde_yaml::Mapping {
        let value = serde_yaml::from_str(source.as_ref()).unwrap();
        match value {
            serde_yaml::Value::Mapping(map) => map,
            _ => panic!("Unexpected {:?}", value),
        }
    }

    #[test]
    fn test_from_config_api_key() {
        let clouds = to_yaml(
            r#"clouds:
  rackspace:
    auth:
      username: user1
    region_name: ORD
    interface: internal"#,
        );

        let secure = to_yaml(
            r#"clouds:
  rackspace:
    auth:
      api_key: key1"#,
        );

        let session = from_files("rackspace", clouds, secure).unwrap();
        assert_eq!(session.endpoint_filters().region, Some("ORD".to_string()));
        assert_eq!(
            session.endpoint_filters().interface,
            InterfaceType::Internal
        );
    }

    #[test]
    fn test_from_config_password() {
        let clouds = to_yaml(
            r#"clouds:
  rackspace:
    auth_type: password
    auth:
      auth_url: http://url1/v2.0
      username: user1
      password: password1
      tenant_id: "123456""#,
        );

        let _ = from_files("rackspace", clouds, Default::default()).unwrap();
    }

    #[test]
    fn test_from_config_none() {
        let clouds = to_yaml(
            r#"clouds:
  local:
    auth_type: none
    auth:
      endpoint: http://url1"#,
        );

        let _ = from_files("local", clouds, Default::default()).unwrap();
    }

    #[test]
    fn test_from_config_none_without_auth() {
        let clouds = to_yaml(
            r#"clouds:
  local:
    auth_type: none"#,
        );

        let _ = from_files("local", clouds, Default::default()).unwrap();
    }

    #[test]
    fn test_from_config_missing_password() {
        let clouds = to_yaml(
            r#"clouds:
  rackspace:
    auth:
      username: user1"#,
        );

        let e = from_files("rackspace", clouds, Default::default())
            .err()
            .unwrap();
        assert_eq!(e.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_from_config_no_such_cloud() {
        let clouds = to_yaml(
            r#"clouds:
  rackspace:
    auth_type: none"#,
        );

        let e = from_files("other", clouds, Default::default())
            .err()
            .unwrap();
        assert_eq!(e.kind(), ErrorKind::InvalidConfig);
        assert!(e.to_string().contains("No such cloud: other"));
    }

    #[test]
    #[cfg(any(feature = "native-tls", feature = "rustls"))]
    fn test_from_config_cacert() {
        let mut cacert = tempfile::NamedTempFile::new().unwrap();
        write!(
            cacert,
            r#"-----BEGIN CERTIFICATE-----
MIIBYzCCAQqgAwIBAgIUJcTlPhsFyWG9S0pAAElKuSFEPBYwCgYIKoZIzj0EAwIw
FDESMBAGA1UEAwwJbG9jYWxob3N0MB4XDTIwMTAwMjExNTU1NloXDTIwMTEwMTEx
NTU1NlowFDESMBAGA1UEAwwJbG9jYWxob3N0MFkwEwYHKoZIzj0CAQYIKoZIzj0D
AQcDQgAEsfpkV9dAThk54U1K+rXUnNbpwuNo5wCRrKpk+cNR/2HBO8VydNj7dkxs
VBUvI7M9hY8dgg1jBVoPcCf0GSOvuqM6MDgwFAYDVR0RBA0wC4IJbG9jYWxob3N0
MAsGA1UdDwQEAwIHgDATBgNVHSUEDDAKBggrBgEFBQcDATAKBggqhkjOPQQDAgNH
ADBEAiAdjF7484kjb3XJoLbgqnZh4V1yHKs57eBVuil9/V0YugIgLwb/vSUAPowb
hK9jLBzNvo8qzKqaGfnGieuLeXCqFDA=
-----END CERTIFICATE-----"#
        )
        .unwrap();
        cacert.flush().unwrap();

        let clouds = to_yaml(format!(
            r#"clouds:
  local:
    auth_type: token
    auth:
      endpoint: https://url1/v1.0/123456
      token: abcdef
    cacert: "{}""#,
            cacert.path().display()
        ));

        let _ = from_files("local", clouds, Default::default()).unwrap();
    }

    #[test]
    fn test_from_config_cacert_not_found() {
        let clouds = to_yaml(
            r#"clouds:
  local:
    auth_type: none
    cacert: /I/do/not/exist"#,
        );

        let e = from_files("local", clouds, Default::default())
            .err()
            .unwrap();
        if cfg!(any(feature = "native-tls", feature = "rustls")) {
            assert!(e.to_string().contains("Cannot open cacert file"));
        } else {
            assert!(e.to_string().contains("TLS support is disabled"));
        }
    }

    #[test]
    fn test_merge_adds_missing_keys() {
        let src = to_yaml(
            r#"clouds:
  rackspace:
    auth:
      api_key: key2
    region_name: DFW"#,
        );
        let mut dest = to_yaml(
            r#"clouds:
  rackspace:
    auth:
      username: user1
    region_name: ORD"#,
        );

        merge_mappings(src, &mut dest);

        let expected = to_yaml(
            r#"clouds:
  rackspace:
    auth:
      username: user1
      api_key: key2
    region_name: DFW"#,
        );
        assert_eq!(dest, expected);
    }

    #[test]
    fn test_merge_type_mismatch() {
        let src = to_yaml(
            r#"
map1:
  map2:
    auth:
      password: password1"#,
        );

        let mut dest = to_yaml(
            r#"
map1:
  map2: 123"#,
        );

        merge_mappings(src.clone(), &mut dest);

        assert_eq!(src, dest);
    }

    #[test]
    fn test_read_config_file_error() {
        let e = read_yaml("doesnt_exist", true).err().unwrap();
        assert_eq!(
            "Configuration file or environment is invalid: doesnt_exist was not found in any location",
            e.to_string()
        );
        assert!(read_yaml("doesnt_exist", false).unwrap().is_empty());
    }

    #[test]
    fn test_find_config_fail() {
        let config = find_config("shouldnt_exist");
        assert_eq!(config, None);
    }
}
