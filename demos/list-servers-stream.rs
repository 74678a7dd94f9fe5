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

//! Streams servers of a region, stopping after the requested number of servers.
//!
//! `RAX_REGION=ORD cargo run --example list-servers-stream -- 10`

use std::env;

use futures::pin_mut;
use futures::stream::TryStreamExt;
use raxcloud::{Error, ErrorKind};

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let limit = match env::args().nth(1) {
        Some(value) => value.parse::<usize>().map_err(|e| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("Invalid limit {}: {}", value, e),
            )
        })?,
        None => usize::MAX,
    };

    let session = raxcloud::from_env()?;
    let region = session.compute().await?;

    let servers = region.servers()?.with_max_pages(1000).into_stream();
    pin_mut!(servers);
    let mut count = 0;
    while count < limit {
        match servers.try_next().await? {
            Some(server) => {
                println!(
                    "{} {} {}",
                    server.id,
                    server.name,
                    server.status.as_deref().unwrap_or("UNKNOWN")
                );
                count += 1;
            }
            None => break,
        }
    }

    Ok(())
}
