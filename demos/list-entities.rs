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

//! Lists monitoring entities with their checks.
//!
//! Credentials come from `RAX_*` environment variables, e.g.
//! `RAX_USERNAME=admin RAX_API_KEY=... cargo run --example list-entities`.
//! Pass a host info type (e.g. `memory`) to also print host information of every entity.

use std::env;

#[tokio::main]
async fn main() -> Result<(), raxcloud::Error> {
    env_logger::init();

    let info_type = env::args().nth(1);
    let session = raxcloud::from_env()?;
    let monitoring = session.monitoring().await?;

    for entity in monitoring.list_entities().await? {
        println!(
            "{} {}",
            entity.id,
            entity.label.as_deref().unwrap_or("<no label>")
        );
        for check in monitoring.list_checks(&entity.id).await? {
            println!(
                "    {} {} {}",
                check.id,
                check.check_type,
                check.label.as_deref().unwrap_or("")
            );
        }

        if let Some(ref info_type) = info_type {
            if entity.agent_id.is_some() {
                let report = monitoring.host_info_by_name(&entity.id, info_type).await?;
                println!("    {:?}", report.info);
            }
        }
    }

    Ok(())
}
