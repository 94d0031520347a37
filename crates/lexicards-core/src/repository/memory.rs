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

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

use crate::error::EngineError;
use crate::repository::CardRepository;
use crate::repository::RepoResult;
use crate::repository::matches_query;
use crate::types::card::Card;
use crate::types::card::CardContent;
use crate::types::card::CardId;
use crate::types::card::Schedule;
use crate::types::card::UserId;
use crate::types::timestamp::Timestamp;

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: HashMap<UserId, BTreeMap<CardId, Card>>,
}

/// A repository that keeps everything in process memory.
///
/// Readers share a lock, so they see a consistent snapshot; writers are
/// serialised, and `update` checks `reps` under the write lock.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RepoResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| EngineError::RepositoryUnavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> RepoResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| EngineError::RepositoryUnavailable("lock poisoned".to_string()))
    }

    fn cards_where(&self, user: &UserId, keep: impl Fn(&Card) -> bool) -> RepoResult<Vec<Card>> {
        let tables = self.read()?;
        let cards = match tables.users.get(user) {
            Some(cards) => cards.values().filter(|c| keep(c)).cloned().collect(),
            None => Vec::new(),
        };
        Ok(cards)
    }
}

impl CardRepository for MemoryRepository {
    fn ensure_user(&self, user: &UserId) -> RepoResult<()> {
        let mut tables = self.write()?;
        tables.users.entry(user.clone()).or_default();
        Ok(())
    }

    fn delete_user(&self, user: &UserId) -> RepoResult<bool> {
        let mut tables = self.write()?;
        Ok(tables.users.remove(user).is_some())
    }

    fn create(
        &self,
        user: &UserId,
        content: &CardContent,
        created: Timestamp,
        schedule: &Schedule,
    ) -> RepoResult<Card> {
        let mut tables = self.write()?;
        tables.next_id += 1;
        let id = CardId::new(tables.next_id);
        let card = Card {
            id,
            user: user.clone(),
            content: content.clone(),
            created,
            schedule: *schedule,
        };
        tables
            .users
            .entry(user.clone())
            .or_default()
            .insert(id, card.clone());
        Ok(card)
    }

    fn get_by_id(&self, user: &UserId, id: CardId) -> RepoResult<Option<Card>> {
        let tables = self.read()?;
        Ok(tables
            .users
            .get(user)
            .and_then(|cards| cards.get(&id))
            .cloned())
    }

    fn get_due(&self, user: &UserId, now: Timestamp) -> RepoResult<Vec<Card>> {
        let mut due = self.cards_where(user, |c| c.schedule.is_due(now))?;
        due.sort_by_key(|c| (c.schedule.due, c.id));
        Ok(due)
    }

    fn list(&self, user: &UserId) -> RepoResult<Vec<Card>> {
        self.cards_where(user, |_| true)
    }

    fn update(
        &self,
        user: &UserId,
        id: CardId,
        expected_reps: u32,
        schedule: &Schedule,
    ) -> RepoResult<Card> {
        let mut tables = self.write()?;
        let card = tables
            .users
            .get_mut(user)
            .and_then(|cards| cards.get_mut(&id))
            .ok_or(EngineError::CardNotFound(id))?;
        if card.schedule.reps != expected_reps {
            return Err(EngineError::ConcurrentUpdate(id));
        }
        card.schedule = *schedule;
        Ok(card.clone())
    }

    fn delete(&self, user: &UserId, id: CardId) -> RepoResult<bool> {
        let mut tables = self.write()?;
        Ok(tables
            .users
            .get_mut(user)
            .and_then(|cards| cards.remove(&id))
            .is_some())
    }

    fn search(&self, user: &UserId, query: &str) -> RepoResult<Vec<Card>> {
        self.cards_where(user, |c| matches_query(c, query))
    }
}
