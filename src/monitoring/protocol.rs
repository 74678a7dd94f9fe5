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

//! JSON structures of the Cloud Monitoring API.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::pagination::{Page, PaginatedResource};
use crate::{Error, ErrorKind};

/// Pagination metadata of a listing.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Metadata {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub marker: Option<String>,
    #[serde(default)]
    pub next_marker: Option<String>,
    #[serde(default)]
    pub next_href: Option<String>,
}

/// One page of a Cloud Monitoring listing.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginatedList<T> {
    pub values: Vec<T>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl<T> From<PaginatedList<T>> for Page<T> {
    fn from(value: PaginatedList<T>) -> Page<T> {
        Page::new(value.values, value.metadata.next_marker)
    }
}

/// A monitored host or device.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Entity {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub managed: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ip_addresses: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

impl PaginatedResource for Entity {
    type Root = PaginatedList<Entity>;
}

/// A monitoring probe attached to an entity.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Check {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub check_type: String,
    #[serde(default)]
    pub details: serde_json::Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub monitoring_zones_poll: Vec<String>,
    #[serde(default)]
    pub timeout: Option<u32>,
    #[serde(default)]
    pub period: Option<u32>,
    #[serde(default)]
    pub target_alias: Option<String>,
    #[serde(default)]
    pub target_hostname: Option<String>,
    #[serde(default)]
    pub target_resolver: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

impl PaginatedResource for Check {
    type Root = PaginatedList<Check>;
}

/// Kind of host information reported by the monitoring agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostInfoType {
    Cpus,
    Memory,
    NetworkInterfaces,
    System,
    Disks,
    Filesystems,
    Processes,
}

impl HostInfoType {
    /// All known host information types.
    pub const ALL: [HostInfoType; 7] = [
        HostInfoType::Cpus,
        HostInfoType::Memory,
        HostInfoType::NetworkInterfaces,
        HostInfoType::System,
        HostInfoType::Disks,
        HostInfoType::Filesystems,
        HostInfoType::Processes,
    ];

    /// Name used in the API path.
    pub fn as_str(self) -> &'static str {
        match self {
            HostInfoType::Cpus => "cpus",
            HostInfoType::Memory => "memory",
            HostInfoType::NetworkInterfaces => "network_interfaces",
            HostInfoType::System => "system",
            HostInfoType::Disks => "disks",
            HostInfoType::Filesystems => "filesystems",
            HostInfoType::Processes => "processes",
        }
    }
}

impl fmt::Display for HostInfoType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostInfoType {
    type Err = Error;

    fn from_str(s: &str) -> Result<HostInfoType, Error> {
        HostInfoType::ALL
            .iter()
            .copied()
            .find(|x| x.as_str() == s)
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidInput,
                    format!("Unknown host information type {}", s),
                )
            })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct CpuInfo {
    pub name: String,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub mhz: Option<u64>,
    #[serde(default)]
    pub total_cores: Option<u32>,
    #[serde(default)]
    pub total_sockets: Option<u32>,
    #[serde(default)]
    pub idle: Option<u64>,
    #[serde(default)]
    pub irq: Option<u64>,
    #[serde(default)]
    pub nice: Option<u64>,
    #[serde(default)]
    pub soft_irq: Option<u64>,
    #[serde(default)]
    pub stolen: Option<u64>,
    #[serde(default)]
    pub sys: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub user: Option<u64>,
    #[serde(default)]
    pub wait: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq)]
pub struct MemoryInfo {
    #[serde(default)]
    pub actual_free: Option<u64>,
    #[serde(default)]
    pub actual_used: Option<u64>,
    #[serde(default)]
    pub free: Option<u64>,
    #[serde(default)]
    pub ram: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub used: Option<u64>,
    #[serde(default)]
    pub swap_free: Option<u64>,
    #[serde(default)]
    pub swap_total: Option<u64>,
    #[serde(default)]
    pub swap_used: Option<u64>,
    #[serde(default)]
    pub swap_page_in: Option<u64>,
    #[serde(default)]
    pub swap_page_out: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct NetworkInterfaceInfo {
    pub name: String,
    #[serde(default, rename = "type")]
    pub interface_type: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub address6: Option<String>,
    #[serde(default)]
    pub broadcast: Option<String>,
    #[serde(default)]
    pub netmask: Option<String>,
    #[serde(default)]
    pub hwaddr: Option<String>,
    #[serde(default)]
    pub mtu: Option<u32>,
    #[serde(default)]
    pub flags: Option<u64>,
    #[serde(default)]
    pub rx_bytes: Option<u64>,
    #[serde(default)]
    pub rx_packets: Option<u64>,
    #[serde(default)]
    pub rx_errors: Option<u64>,
    #[serde(default)]
    pub rx_dropped: Option<u64>,
    #[serde(default)]
    pub tx_bytes: Option<u64>,
    #[serde(default)]
    pub tx_packets: Option<u64>,
    #[serde(default)]
    pub tx_errors: Option<u64>,
    #[serde(default)]
    pub tx_dropped: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct SystemInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub vendor_name: Option<String>,
    #[serde(default)]
    pub vendor_version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct DiskInfo {
    pub name: String,
    #[serde(default)]
    pub reads: Option<u64>,
    #[serde(default)]
    pub read_bytes: Option<u64>,
    #[serde(default)]
    pub rtime: Option<u64>,
    #[serde(default)]
    pub writes: Option<u64>,
    #[serde(default)]
    pub write_bytes: Option<u64>,
    #[serde(default)]
    pub wtime: Option<u64>,
    #[serde(default)]
    pub time: Option<u64>,
    #[serde(default)]
    pub io: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct FilesystemInfo {
    pub dir_name: String,
    #[serde(default)]
    pub dev_name: Option<String>,
    #[serde(default)]
    pub sys_type_name: Option<String>,
    #[serde(default)]
    pub options: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub free: Option<u64>,
    #[serde(default)]
    pub used: Option<u64>,
    #[serde(default)]
    pub avail: Option<u64>,
    #[serde(default)]
    pub files: Option<u64>,
    #[serde(default)]
    pub free_files: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ProcessInfo {
    pub pid: u64,
    #[serde(default)]
    pub exe_name: Option<String>,
    #[serde(default)]
    pub exe_cwd: Option<String>,
    #[serde(default)]
    pub exe_root: Option<String>,
    #[serde(default)]
    pub state_name: Option<String>,
    #[serde(default)]
    pub state_ppid: Option<u64>,
    #[serde(default)]
    pub state_priority: Option<i64>,
    #[serde(default)]
    pub state_threads: Option<u64>,
    #[serde(default)]
    pub time_start_time: Option<u64>,
    #[serde(default)]
    pub time_user: Option<u64>,
    #[serde(default)]
    pub time_sys: Option<u64>,
    #[serde(default)]
    pub time_total: Option<u64>,
    #[serde(default)]
    pub memory_size: Option<u64>,
    #[serde(default)]
    pub memory_resident: Option<u64>,
    #[serde(default)]
    pub memory_share: Option<u64>,
    #[serde(default)]
    pub cred_user: Option<String>,
    #[serde(default)]
    pub cred_group: Option<String>,
}

/// Host information of one of the [HostInfoType](enum.HostInfoType.html) kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum HostInfo {
    Cpus(Vec<CpuInfo>),
    Memory(MemoryInfo),
    NetworkInterfaces(Vec<NetworkInterfaceInfo>),
    System(SystemInfo),
    Disks(Vec<DiskInfo>),
    Filesystems(Vec<FilesystemInfo>),
    Processes(Vec<ProcessInfo>),
}

impl HostInfo {
    /// Kind of this information.
    pub fn info_type(&self) -> HostInfoType {
        match self {
            HostInfo::Cpus(..) => HostInfoType::Cpus,
            HostInfo::Memory(..) => HostInfoType::Memory,
            HostInfo::NetworkInterfaces(..) => HostInfoType::NetworkInterfaces,
            HostInfo::System(..) => HostInfoType::System,
            HostInfo::Disks(..) => HostInfoType::Disks,
            HostInfo::Filesystems(..) => HostInfoType::Filesystems,
            HostInfo::Processes(..) => HostInfoType::Processes,
        }
    }

    /// Decode a host information response of the given kind.
    pub fn decode(info_type: HostInfoType, body: &[u8]) -> Result<HostInfoReport, Error> {
        fn parse<T, F>(body: &[u8], wrap: F) -> Result<HostInfoReport, Error>
        where
            T: serde::de::DeserializeOwned,
            F: FnOnce(T) -> HostInfo,
        {
            let root: HostInfoRoot<T> = serde_json::from_slice(body)?;
            Ok(HostInfoReport {
                timestamp: root.timestamp,
                info: wrap(root.info),
            })
        }

        match info_type {
            HostInfoType::Cpus => parse(body, HostInfo::Cpus),
            HostInfoType::Memory => parse(body, HostInfo::Memory),
            HostInfoType::NetworkInterfaces => parse(body, HostInfo::NetworkInterfaces),
            HostInfoType::System => parse(body, HostInfo::System),
            HostInfoType::Disks => parse(body, HostInfo::Disks),
            HostInfoType::Filesystems => parse(body, HostInfo::Filesystems),
            HostInfoType::Processes => parse(body, HostInfo::Processes),
        }
    }
}

/// Host information together with the time the agent collected it.
#[derive(Debug, Clone, PartialEq)]
pub struct HostInfoReport {
    /// Collection time in milliseconds since the epoch.
    pub timestamp: Option<i64>,
    pub info: HostInfo,
}

#[derive(Debug, Deserialize)]
struct HostInfoRoot<T> {
    #[serde(default)]
    timestamp: Option<i64>,
    info: T,
}

/// Targets an agent check type can be pointed at.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AgentTargets {
    #[serde(default)]
    pub targets: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_entity_list_decode() {
        let body = json!({
            "values": [
                {
                    "id": "enAAAAA",
                    "label": "web01",
                    "ip_addresses": {"public0_v4": "192.0.2.10"},
                    "metadata": null,
                    "managed": false,
                    "uri": null,
                    "agent_id": "web01",
                    "created_at": 1318366993521i64,
                    "updated_at": 1318366993521i64
                }
            ],
            "metadata": {
                "count": 1,
                "limit": 100,
                "marker": null,
                "next_marker": "enBBBBB",
                "next_href": "https://monitoring.api.rackspacecloud.com/v1.0/123456/entities?marker=enBBBBB"
            }
        });
        let list: PaginatedList<Entity> = serde_json::from_value(body).unwrap();
        let page: Page<Entity> = list.into();
        assert_eq!(page.next_marker.as_deref(), Some("enBBBBB"));
        assert_eq!(page.items.len(), 1);
        let entity = &page.items[0];
        assert_eq!(entity.label.as_deref(), Some("web01"));
        assert!(entity.metadata.is_empty());
        assert_eq!(entity.ip_addresses["public0_v4"], "192.0.2.10");
    }

    #[test]
    fn test_list_without_metadata() {
        let list: PaginatedList<Check> = serde_json::from_value(json!({"values": []})).unwrap();
        let page: Page<Check> = list.into();
        assert!(page.items.is_empty());
        assert!(page.next_marker.is_none());
    }

    #[test]
    fn test_host_info_type_parse() {
        for info_type in HostInfoType::ALL.iter() {
            assert_eq!(
                info_type.as_str().parse::<HostInfoType>().unwrap(),
                *info_type
            );
        }
        let err = "gpus".parse::<HostInfoType>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_host_info_decode() {
        let body = json!({
            "timestamp": 1372887283468i64,
            "info": {
                "actual_free": 1000,
                "actual_used": 2000,
                "total": 3000
            }
        });
        let report =
            HostInfo::decode(HostInfoType::Memory, body.to_string().as_bytes()).unwrap();
        assert_eq!(report.timestamp, Some(1372887283468));
        assert_eq!(report.info.info_type(), HostInfoType::Memory);
        match report.info {
            HostInfo::Memory(mem) => assert_eq!(mem.total, Some(3000)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_host_info_decode_wrong_shape() {
        let body = json!({"info": {"total": 3000}});
        let err = HostInfo::decode(HostInfoType::Cpus, body.to_string().as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    }
}
