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

//! A stream of resources.

use async_stream::try_stream;
use futures::pin_mut;
use futures::stream::{Stream, TryStreamExt};

use super::pagination::Paginator;
use super::Error;

fn chunks<T>(mut paginator: Paginator<T>) -> impl Stream<Item = Result<Vec<T>, Error>> {
    try_stream! {
        while let Some(items) = paginator.next_page().await? {
            yield items;
        }
    }
}

impl<T> Paginator<T> {
    /// Turn the paginator into a stream of items.
    ///
    /// Pages are only requested when the previous one is consumed. Items from pages fetched
    /// before an error have already been yielded; use [fetch_all](#method.fetch_all) to get
    /// all-or-nothing behavior.
    ///
    /// ```rust,no_run
    /// # async fn example(region: raxcloud::compute::Region) -> Result<(), raxcloud::Error> {
    /// use futures::TryStreamExt;
    ///
    /// let servers = region.servers()?.into_stream();
    /// futures::pin_mut!(servers);
    /// while let Some(server) = servers.try_next().await? {
    ///     println!("{} {}", server.id, server.name);
    /// }
    /// # Ok(()) }
    /// ```
    pub fn into_stream(self) -> impl Stream<Item = Result<T, Error>> {
        try_stream! {
            let iter = chunks(self);
            pin_mut!(iter);
            while let Some(chunk) = iter.try_next().await? {
                for item in chunk {
                    yield item;
                }
            }
        }
    }
}
