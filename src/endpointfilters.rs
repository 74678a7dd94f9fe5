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

//! Endpoint filters for looking up endpoints.

use std::fmt;
use std::str::FromStr;

use super::{Error, ErrorKind};

/// Interface type: public or internal (ServiceNet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InterfaceType {
    /// Public interface (used by default).
    #[default]
    Public,
    /// Internal interface.
    Internal,
}

/// Endpoint filters for looking up endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct EndpointFilters {
    /// Endpoint interface to use.
    pub interface: InterfaceType,
    /// Cloud region.
    ///
    /// Endpoints without a region (global services) match any region.
    pub region: Option<String>,
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        f.write_str(match self {
            InterfaceType::Public => "public",
            InterfaceType::Internal => "internal",
        })
    }
}

impl FromStr for InterfaceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "public" | "publicURL" => Ok(InterfaceType::Public),
            "internal" | "internalURL" | "servicenet" => Ok(InterfaceType::Internal),
            _ => Err(Error::new(
                ErrorKind::InvalidInput,
                format!("Invalid interface type: {}", s),
            )),
        }
    }
}

impl EndpointFilters {
    /// Create filters with interface and region.
    #[inline]
    pub fn new<S: Into<String>>(interface: InterfaceType, region: Option<S>) -> EndpointFilters {
        EndpointFilters {
            interface,
            region: region.map(Into::into),
        }
    }

    /// Set the interface to use.
    #[inline]
    pub fn set_interface(&mut self, interface: InterfaceType) {
        self.interface = interface;
    }

    /// Set the region to use.
    #[inline]
    pub fn set_region<S: Into<String>>(&mut self, region: S) {
        self.region = Some(region.into());
    }

    /// Use the given interface.
    #[inline]
    pub fn with_interface(mut self, interface: InterfaceType) -> Self {
        self.set_interface(interface);
        self
    }

    /// Use the given region.
    #[inline]
    pub fn with_region<S: Into<String>>(mut self, region: S) -> Self {
        self.set_region(region);
        self
    }

    /// Whether an endpoint in the given region is acceptable.
    pub fn check_region(&self, region: Option<&str>) -> bool {
        match (self.region.as_deref(), region) {
            (Some(wanted), Some(actual)) => wanted.eq_ignore_ascii_case(actual),
            _ => true,
        }
    }
}
