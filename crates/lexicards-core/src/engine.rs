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

//! The scheduling engine: card creation, the due set, and review answers.

use serde::Deserialize;
use serde::Serialize;

use crate::config::SchedulerConfig;
use crate::error::EngineError;
use crate::memory::MemoryOutcome;
use crate::memory::MemoryState;
use crate::memory::review;
use crate::repository::CardRepository;
use crate::search::DEFAULT_SEARCH_LIMIT;
use crate::search::rank;
use crate::state::CardState;
use crate::state::next_counters;
use crate::types::card::Card;
use crate::types::card::CardId;
use crate::types::card::CardInput;
use crate::types::card::Schedule;
use crate::types::card::UserId;
use crate::types::rating::Rating;
use crate::types::timestamp::Timestamp;

/// Card counts for one user at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: usize,
    pub due: usize,
    pub learning: usize,
    pub review: usize,
    pub relearning: usize,
}

impl Stats {
    pub fn from_cards<'a>(cards: impl IntoIterator<Item = &'a Card>, now: Timestamp) -> Self {
        let mut stats = Stats::default();
        for card in cards {
            stats.total += 1;
            if card.schedule.is_due(now) {
                stats.due += 1;
            }
            match card.schedule.state {
                CardState::Learning => stats.learning += 1,
                CardState::Review => stats.review += 1,
                CardState::Relearning => stats.relearning += 1,
            }
        }
        stats
    }
}

/// Check the invariants a stored schedule must satisfy before it is fed to
/// the memory model.
pub fn check_schedule(schedule: &Schedule) -> Result<(), EngineError> {
    let corrupt = |msg: String| -> Result<(), EngineError> {
        Err(EngineError::CorruptCardState(msg))
    };
    let Schedule {
        state,
        stability,
        elapsed_days,
        scheduled_days,
        reps,
        lapses,
        last_reviewed,
        ..
    } = *schedule;
    if !stability.is_finite() || stability < 0.0 {
        return corrupt(format!("stability out of range: {stability}"));
    }
    if !elapsed_days.is_finite() || elapsed_days < 0.0 {
        return corrupt(format!("elapsed days out of range: {elapsed_days}"));
    }
    if !scheduled_days.is_finite() || scheduled_days < 0.0 {
        return corrupt(format!("scheduled days out of range: {scheduled_days}"));
    }
    if lapses > reps {
        return corrupt(format!("{lapses} lapses but only {reps} reviews"));
    }
    if reps == 0 {
        if stability != 0.0 || last_reviewed.is_some() || state != CardState::Learning {
            return corrupt("never-reviewed card carries review state".to_string());
        }
    } else {
        if stability == 0.0 {
            return corrupt("reviewed card has zero stability".to_string());
        }
        if last_reviewed.is_none() {
            return corrupt("reviewed card has no review timestamp".to_string());
        }
    }
    Ok(())
}

/// Compute the schedule that results from answering `card` with `rating` at
/// `now`. Pure: the same inputs always give the same schedule.
pub fn schedule_review(
    config: &SchedulerConfig,
    card: &Card,
    rating: Rating,
    now: Timestamp,
) -> Result<Schedule, EngineError> {
    let current = &card.schedule;
    check_schedule(current)?;
    let elapsed_days = match current.last_reviewed {
        Some(last) => {
            let days = now.days_since(last);
            if days < 0.0 {
                log::warn!(
                    "card {} reviewed at {now}, before its last review at {last}",
                    card.id
                );
                0.0
            } else {
                days
            }
        }
        None => 0.0,
    };
    let MemoryOutcome {
        stability,
        difficulty,
        scheduled_days,
    } = review(
        config,
        MemoryState {
            stability: current.stability,
            difficulty: current.difficulty,
            elapsed_days,
        },
        rating,
    )?;
    let state = current
        .state
        .transition(rating, stability, config.graduation_stability);
    let (reps, lapses) = next_counters(current.reps, current.lapses, rating);
    let due = now.plus_days(scheduled_days).ok_or_else(|| {
        EngineError::InvalidCardData(format!(
            "a {scheduled_days}-day interval from {now} ends past the last representable date"
        ))
    })?;
    Ok(Schedule {
        state,
        due,
        stability,
        difficulty,
        elapsed_days,
        scheduled_days,
        reps,
        lapses,
        last_reviewed: Some(now),
    })
}

/// Orchestrates the memory model, the state machine, and a repository.
pub struct Engine<R> {
    repo: R,
    config: SchedulerConfig,
    search_limit: usize,
}

impl<R: CardRepository> Engine<R> {
    pub fn new(repo: R, config: SchedulerConfig) -> Self {
        Self {
            repo,
            config,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Validate content and store a new card, due immediately.
    pub fn create_card(
        &self,
        user: &UserId,
        input: CardInput,
        now: Timestamp,
    ) -> Result<Card, EngineError> {
        let content = input.validate()?;
        self.repo.ensure_user(user)?;
        let card = self.repo.create(user, &content, now, &Schedule::new(now))?;
        log::debug!("created card {} ({}) for {user}", card.id, card.word());
        Ok(card)
    }

    /// Every card with `due <= now`, most overdue first, ties in creation
    /// order.
    pub fn get_due_cards(&self, user: &UserId, now: Timestamp) -> Result<Vec<Card>, EngineError> {
        let mut due: Vec<Card> = self
            .repo
            .get_due(user, now)?
            .into_iter()
            .filter(|card| card.schedule.is_due(now))
            .collect();
        due.sort_by_key(|card| (card.schedule.due, card.created, card.id));
        Ok(due)
    }

    pub fn get_card(&self, user: &UserId, id: CardId) -> Result<Card, EngineError> {
        self.repo
            .get_by_id(user, id)?
            .ok_or(EngineError::CardNotFound(id))
    }

    /// Apply a review to a card and persist the result.
    ///
    /// The write only succeeds if nobody else answered the card since it was
    /// loaded; otherwise [`EngineError::ConcurrentUpdate`] is returned and the
    /// stored card is untouched.
    pub fn answer_card(
        &self,
        user: &UserId,
        id: CardId,
        rating: Rating,
        now: Timestamp,
    ) -> Result<Card, EngineError> {
        let card = self.get_card(user, id)?;
        let schedule = match schedule_review(&self.config, &card, rating, now) {
            Ok(schedule) => schedule,
            Err(e) => {
                if let EngineError::CorruptCardState(msg) = &e {
                    log::error!("card {id} of {user} is corrupt: {msg}");
                }
                return Err(e);
            }
        };
        match self.repo.update(user, id, card.schedule.reps, &schedule) {
            Ok(updated) => {
                log::debug!(
                    "card {id} rated {}: {} -> {}, due {}",
                    rating.as_str(),
                    card.schedule.state,
                    updated.schedule.state,
                    updated.schedule.due
                );
                Ok(updated)
            }
            Err(EngineError::ConcurrentUpdate(id)) => {
                log::warn!("lost a concurrent update on card {id} of {user}");
                Err(EngineError::ConcurrentUpdate(id))
            }
            Err(e) => Err(e),
        }
    }

    pub fn get_stats(&self, user: &UserId, now: Timestamp) -> Result<Stats, EngineError> {
        let cards = self.repo.list(user)?;
        Ok(Stats::from_cards(&cards, now))
    }

    /// Cards matching `query`, best matches first, at most the configured
    /// search limit.
    pub fn search_similar(&self, user: &UserId, query: &str) -> Result<Vec<Card>, EngineError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let candidates = self.repo.search(user, query)?;
        Ok(rank(candidates, query, self.search_limit))
    }

    pub fn delete_card(&self, user: &UserId, id: CardId) -> Result<(), EngineError> {
        if self.repo.delete(user, id)? {
            log::debug!("deleted card {id} of {user}");
            Ok(())
        } else {
            Err(EngineError::CardNotFound(id))
        }
    }

    /// Delete a user and their cards. Returns whether the user existed.
    pub fn delete_user(&self, user: &UserId) -> Result<bool, EngineError> {
        let existed = self.repo.delete_user(user)?;
        if existed {
            log::debug!("deleted user {user}");
        }
        Ok(existed)
    }
}
