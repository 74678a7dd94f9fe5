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

//! Asynchronous client for the Rackspace cloud monitoring and compute APIs.
//!
//! # Sessions
//!
//! A [Session](struct.Session.html) pairs an [authentication type](trait.AuthType.html) with
//! endpoint filters and produces service clients:
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), raxcloud::Error> {
//! let auth = raxcloud::identity::ApiKey::new(
//!     raxcloud::identity::DEFAULT_AUTH_URL,
//!     "admin",
//!     "0123456789abcdef",
//! )?;
//! let session = raxcloud::Session::new(auth).with_region("ORD");
//!
//! let monitoring = session.monitoring().await?;
//! let entities = monitoring.list_entities().await?;
//!
//! let region = session.compute().await?;
//! let servers = region.list_servers().await?;
//! # Ok(()) }
//! ```
//!
//! Sessions can also be created from `RAX_*` environment variables with
//! [from_env](fn.from_env.html) or from a `clouds.yaml` file with
//! [from_config](fn.from_config.html).
//!
//! # Pagination
//!
//! Listings follow the server-provided markers until the last page and return either all items
//! or an error. A [Paginator](struct.Paginator.html) gives page by page control and, with the
//! `stream` feature, a lazy stream of items.
//!
//! # Logging
//!
//! The crate logs through the `log` facade. Enable the `trace` level for `raxcloud` to see every
//! HTTP request.

#![crate_name = "raxcloud"]
// NOTE: we do not use generic deny(warnings) to avoid breakages with new
// versions of the compiler. Add more warnings here as you discover them.
// Taken from https://github.com/rust-unofficial/patterns/
#![deny(
    dead_code,
    improper_ctypes,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    trivial_casts,
    trivial_numeric_casts,
    unconditional_recursion,
    unsafe_code,
    unused,
    unused_allocation,
    unused_comparisons,
    unused_doc_comments,
    unused_import_braces,
    unused_parens,
    unused_qualifications,
    unused_results,
    while_true
)]
#![allow(
    clippy::new_ret_no_self,
    clippy::should_implement_trait,
    clippy::wrong_self_convention
)]

mod auth;
mod catalog;
pub mod client;
pub mod compute;
mod endpointfilters;
mod error;
pub mod identity;
mod loading;
pub mod monitoring;
mod pagination;
pub mod services;
mod session;
#[cfg(feature = "stream")]
mod stream;
mod url;

pub use crate::auth::{AuthType, NoAuth, StaticToken, AUTH_TOKEN_HEADER};
pub use crate::client::AuthenticatedClient;
pub use crate::endpointfilters::{EndpointFilters, InterfaceType};
pub use crate::error::{Error, ErrorKind};
pub use crate::loading::{from_config, from_env};
pub use crate::pagination::{Page, PaginatedResource, Paginator, MARKER_PARAMETER};
pub use crate::session::Session;
