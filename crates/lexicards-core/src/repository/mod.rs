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

//! The persistence contract the engine depends on.

pub mod cache;
pub mod memory;

use crate::error::EngineError;
use crate::types::card::Card;
use crate::types::card::CardContent;
use crate::types::card::CardId;
use crate::types::card::Schedule;
use crate::types::card::UserId;
use crate::types::timestamp::Timestamp;

pub type RepoResult<T> = Result<T, EngineError>;

/// Card storage, independent of the backing technology.
///
/// Every method is a single bounded round trip. Failures of the store itself
/// are reported as [`EngineError::RepositoryUnavailable`] and never retried
/// here.
pub trait CardRepository: Send + Sync {
    /// Create the user if it does not exist yet.
    fn ensure_user(&self, user: &UserId) -> RepoResult<()>;

    /// Delete a user and all of their cards. Returns whether the user existed.
    fn delete_user(&self, user: &UserId) -> RepoResult<bool>;

    /// Store a new card, assigning it the next id.
    fn create(
        &self,
        user: &UserId,
        content: &CardContent,
        created: Timestamp,
        schedule: &Schedule,
    ) -> RepoResult<Card>;

    fn get_by_id(&self, user: &UserId, id: CardId) -> RepoResult<Option<Card>>;

    /// Cards with `due <= now`, ordered by due date then id.
    fn get_due(&self, user: &UserId, now: Timestamp) -> RepoResult<Vec<Card>>;

    /// All of the user's cards in creation order.
    fn list(&self, user: &UserId) -> RepoResult<Vec<Card>>;

    /// Replace a card's schedule, provided its stored `reps` still equals
    /// `expected_reps`.
    ///
    /// Fails with [`EngineError::ConcurrentUpdate`] if another update got
    /// there first, and [`EngineError::CardNotFound`] if the card is gone.
    fn update(
        &self,
        user: &UserId,
        id: CardId,
        expected_reps: u32,
        schedule: &Schedule,
    ) -> RepoResult<Card>;

    /// Returns whether the card existed.
    fn delete(&self, user: &UserId, id: CardId) -> RepoResult<bool>;

    /// Cards whose word or translation contains `query`, ignoring case. No
    /// particular order.
    fn search(&self, user: &UserId, query: &str) -> RepoResult<Vec<Card>>;
}

impl<T: CardRepository + ?Sized> CardRepository for Box<T> {
    fn ensure_user(&self, user: &UserId) -> RepoResult<()> {
        (**self).ensure_user(user)
    }

    fn delete_user(&self, user: &UserId) -> RepoResult<bool> {
        (**self).delete_user(user)
    }

    fn create(
        &self,
        user: &UserId,
        content: &CardContent,
        created: Timestamp,
        schedule: &Schedule,
    ) -> RepoResult<Card> {
        (**self).create(user, content, created, schedule)
    }

    fn get_by_id(&self, user: &UserId, id: CardId) -> RepoResult<Option<Card>> {
        (**self).get_by_id(user, id)
    }

    fn get_due(&self, user: &UserId, now: Timestamp) -> RepoResult<Vec<Card>> {
        (**self).get_due(user, now)
    }

    fn list(&self, user: &UserId) -> RepoResult<Vec<Card>> {
        (**self).list(user)
    }

    fn update(
        &self,
        user: &UserId,
        id: CardId,
        expected_reps: u32,
        schedule: &Schedule,
    ) -> RepoResult<Card> {
        (**self).update(user, id, expected_reps, schedule)
    }

    fn delete(&self, user: &UserId, id: CardId) -> RepoResult<bool> {
        (**self).delete(user, id)
    }

    fn search(&self, user: &UserId, query: &str) -> RepoResult<Vec<Card>> {
        (**self).search(user, query)
    }
}

/// Case-insensitive substring test shared by the repositories.
pub fn matches_query(card: &Card, query: &str) -> bool {
    let query = query.to_lowercase();
    card.word().to_lowercase().contains(&query)
        || card.translation().to_lowercase().contains(&query)
}

#[cfg(any(test, feature = "testing"))]
pub mod contract {
    //! Behaviour every [`CardRepository`] must show. Run against each
    //! implementation from its own test module.

    use super::*;
    use crate::state::CardState;
    use crate::types::card::CardInput;

    pub fn ts(s: &str) -> Timestamp {
        Timestamp::try_from(s.to_string()).unwrap()
    }

    pub fn user(name: &str) -> UserId {
        UserId::new(name).unwrap()
    }

    pub fn add(repo: &dyn CardRepository, user: &UserId, word: &str, created: &str) -> Card {
        let created = ts(created);
        let content = CardInput::new(word).translation(format!("{word}-tr")).validate().unwrap();
        repo.ensure_user(user).unwrap();
        repo.create(user, &content, created, &Schedule::new(created)).unwrap()
    }

    pub fn create_and_get(repo: &dyn CardRepository) {
        let alice = user("alice");
        let card = add(repo, &alice, "Hund", "2024-01-01T00:00:00.000Z");
        assert_eq!(card.word(), "Hund");
        assert_eq!(card.user, alice);
        assert_eq!(card.schedule.state, CardState::Learning);
        let fetched = repo.get_by_id(&alice, card.id).unwrap();
        assert_eq!(fetched, Some(card.clone()));
        // Another user cannot see it.
        assert_eq!(repo.get_by_id(&user("bob"), card.id).unwrap(), None);
    }

    pub fn ids_follow_creation_order(repo: &dyn CardRepository) {
        let alice = user("alice");
        let a = add(repo, &alice, "a", "2024-01-01T00:00:00.000Z");
        let b = add(repo, &alice, "b", "2024-01-01T00:00:00.000Z");
        assert!(a.id < b.id);
        let listed: Vec<String> = repo
            .list(&alice)
            .unwrap()
            .into_iter()
            .map(|c| c.content.word)
            .collect();
        assert_eq!(listed, vec!["a", "b"]);
    }

    pub fn due_filter_and_order(repo: &dyn CardRepository) {
        let alice = user("alice");
        let late = add(repo, &alice, "late", "2024-01-03T00:00:00.000Z");
        let early = add(repo, &alice, "early", "2024-01-01T00:00:00.000Z");
        let tie = add(repo, &alice, "tie", "2024-01-01T00:00:00.000Z");
        add(repo, &alice, "future", "2024-02-01T00:00:00.000Z");
        add(repo, &user("bob"), "other", "2024-01-01T00:00:00.000Z");
        let due = repo.get_due(&alice, ts("2024-01-03T00:00:00.000Z")).unwrap();
        let ids: Vec<CardId> = due.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![early.id, tie.id, late.id]);
    }

    pub fn update_is_compare_and_swap(repo: &dyn CardRepository) {
        let alice = user("alice");
        let card = add(repo, &alice, "Katze", "2024-01-01T00:00:00.000Z");
        let mut schedule = card.schedule;
        schedule.reps = 1;
        schedule.stability = 3.0;
        schedule.difficulty = 5.0;
        schedule.state = CardState::Review;
        schedule.due = ts("2024-01-04T00:00:00.000Z");
        schedule.last_reviewed = Some(ts("2024-01-01T00:00:00.000Z"));
        let updated = repo.update(&alice, card.id, 0, &schedule).unwrap();
        assert_eq!(updated.schedule, schedule);
        assert_eq!(updated.content, card.content);
        // A second writer still holding the old snapshot loses.
        let stale = repo.update(&alice, card.id, 0, &schedule);
        assert_eq!(stale, Err(EngineError::ConcurrentUpdate(card.id)));
        let missing = repo.update(&alice, CardId::new(9999), 0, &schedule);
        assert_eq!(missing, Err(EngineError::CardNotFound(CardId::new(9999))));
        let foreign = repo.update(&user("bob"), card.id, 1, &schedule);
        assert_eq!(foreign, Err(EngineError::CardNotFound(card.id)));
    }

    pub fn delete_card_and_user(repo: &dyn CardRepository) {
        let alice = user("alice");
        let bob = user("bob");
        let a = add(repo, &alice, "eins", "2024-01-01T00:00:00.000Z");
        let b = add(repo, &alice, "zwei", "2024-01-01T00:00:00.000Z");
        let c = add(repo, &bob, "drei", "2024-01-01T00:00:00.000Z");
        assert!(!repo.delete(&bob, a.id).unwrap());
        assert!(repo.delete(&alice, a.id).unwrap());
        assert!(!repo.delete(&alice, a.id).unwrap());
        assert!(repo.delete_user(&alice).unwrap());
        assert!(!repo.delete_user(&alice).unwrap());
        assert_eq!(repo.get_by_id(&alice, b.id).unwrap(), None);
        assert!(repo.list(&alice).unwrap().is_empty());
        assert_eq!(repo.get_by_id(&bob, c.id).unwrap().map(|c| c.id), Some(c.id));
    }

    pub fn search_is_case_insensitive(repo: &dyn CardRepository) {
        let alice = user("alice");
        add(repo, &alice, "Language", "2024-01-01T00:00:00.000Z");
        add(repo, &alice, "lane", "2024-01-01T00:00:00.000Z");
        add(repo, &user("bob"), "slang", "2024-01-01T00:00:00.000Z");
        let found: Vec<String> = repo
            .search(&alice, "LANG")
            .unwrap()
            .into_iter()
            .map(|c| c.content.word)
            .collect();
        assert_eq!(found, vec!["Language"]);
        // Translations are searched too.
        assert_eq!(repo.search(&alice, "ane-tr").unwrap().len(), 1);
    }

    pub fn run_all<R: CardRepository>(make: impl Fn() -> R) {
        create_and_get(&make());
        ids_follow_creation_order(&make());
        due_filter_and_order(&make());
        update_is_compare_and_swap(&make());
        delete_card_and_user(&make());
        search_is_case_insensitive(&make());
    }
}
