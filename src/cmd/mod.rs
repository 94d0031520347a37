// Copyright 2025 Fernando Borretti
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

pub mod cards;
pub mod serve;
pub mod stats;

use std::path::PathBuf;

use lexicards_core::CachedRepository;
use lexicards_core::CardRepository;
use lexicards_core::Engine;
use lexicards_core::UserId;
use lexicards_core::error::Fallible;

use crate::config::AppConfig;
use crate::db::SqliteRepository;

/// The engine as the application runs it: the repository is chosen at
/// startup from the configuration.
pub type AppEngine = Engine<Box<dyn CardRepository>>;

/// Open the configured database and build an engine over it. `database`
/// overrides the configured path.
pub fn open_engine(config: &AppConfig, database: Option<PathBuf>) -> Fallible<AppEngine> {
    let path = database.unwrap_or_else(|| config.storage.database.clone());
    log::debug!("Opening database at {}", path.display());
    let db = SqliteRepository::open(&path)?;
    let repo: Box<dyn CardRepository> = if config.storage.cache {
        Box::new(CachedRepository::new(db))
    } else {
        Box::new(db)
    };
    Ok(Engine::new(repo, config.scheduler.clone()).with_search_limit(config.search.limit))
}

pub fn parse_user(user: String) -> Fallible<UserId> {
    Ok(UserId::new(user)?)
}
