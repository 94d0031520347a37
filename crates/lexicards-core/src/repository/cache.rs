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

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::error::EngineError;
use crate::repository::CardRepository;
use crate::repository::RepoResult;
use crate::types::card::Card;
use crate::types::card::CardContent;
use crate::types::card::CardId;
use crate::types::card::Schedule;
use crate::types::card::UserId;
use crate::types::timestamp::Timestamp;

#[derive(Default)]
struct Cache {
    /// Bumped on every invalidation.
    generation: u64,
    /// Only cards that exist. Misses always reach the inner repository.
    entries: HashMap<(UserId, CardId), Card>,
}

/// Memoises lookups of existing cards in another repository.
///
/// Every write clears the whole cache, whatever it touched. A lookup that
/// raced with a write does not store its result.
pub struct CachedRepository<R> {
    inner: R,
    cache: Mutex<Cache>,
}

impl<R: CardRepository> CachedRepository<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: Mutex::new(Cache::default()),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Number of memoised lookups.
    pub fn cached_entries(&self) -> usize {
        self.lock().map(|c| c.entries.len()).unwrap_or(0)
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Cache>> {
        self.cache
            .lock()
            .map_err(|_| EngineError::RepositoryUnavailable("cache lock poisoned".to_string()))
    }

    fn invalidate(&self) -> RepoResult<()> {
        let mut cache = self.lock()?;
        cache.generation += 1;
        cache.entries.clear();
        Ok(())
    }

    /// Run a write against the inner repository, then drop the cache even if
    /// the write failed.
    fn write<T>(&self, op: impl FnOnce(&R) -> RepoResult<T>) -> RepoResult<T> {
        let result = op(&self.inner);
        self.invalidate()?;
        result
    }
}

impl<R: CardRepository> CardRepository for CachedRepository<R> {
    fn ensure_user(&self, user: &UserId) -> RepoResult<()> {
        self.inner.ensure_user(user)
    }

    fn delete_user(&self, user: &UserId) -> RepoResult<bool> {
        self.write(|inner| inner.delete_user(user))
    }

    fn create(
        &self,
        user: &UserId,
        content: &CardContent,
        created: Timestamp,
        schedule: &Schedule,
    ) -> RepoResult<Card> {
        self.write(|inner| inner.create(user, content, created, schedule))
    }

    fn get_by_id(&self, user: &UserId, id: CardId) -> RepoResult<Option<Card>> {
        let key = (user.clone(), id);
        let generation = {
            let cache = self.lock()?;
            if let Some(hit) = cache.entries.get(&key) {
                return Ok(Some(hit.clone()));
            }
            cache.generation
        };
        let card = self.inner.get_by_id(user, id)?;
        if let Some(card) = &card {
            let mut cache = self.lock()?;
            if cache.generation == generation {
                cache.entries.insert(key, card.clone());
            }
        }
        Ok(card)
    }

    fn get_due(&self, user: &UserId, now: Timestamp) -> RepoResult<Vec<Card>> {
        self.inner.get_due(user, now)
    }

    fn list(&self, user: &UserId) -> RepoResult<Vec<Card>> {
        self.inner.list(user)
    }

    fn update(
        &self,
        user: &UserId,
        id: CardId,
        expected_reps: u32,
        schedule: &Schedule,
    ) -> RepoResult<Card> {
        self.write(|inner| inner.update(user, id, expected_reps, schedule))
    }

    fn delete(&self, user: &UserId, id: CardId) -> RepoResult<bool> {
        self.write(|inner| inner.delete(user, id))
    }

    fn search(&self, user: &UserId, query: &str) -> RepoResult<Vec<Card>> {
        self.inner.search(user, query)
    }
}
