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

//! Handy primitives for working with URLs.

use reqwest::Url;

use super::{Error, ErrorKind};

/// Append path segments to a base URL.
///
/// Segments are percent-encoded, so an ID containing `/` stays a single segment.
#[allow(unused_results)]
pub fn extend<I>(mut url: Url, segments: I) -> Result<Url, Error>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    url.path_segments_mut()
        .map_err(|_| {
            Error::new(
                ErrorKind::InvalidInput,
                "Base URL cannot have path segments",
            )
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
