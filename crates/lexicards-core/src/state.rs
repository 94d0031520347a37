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

//! The card state machine.
//!
//! Cards start in [`CardState::Learning`] and cycle between the three states
//! forever. A rating moves a card according to this table, where "graduates"
//! means the stability produced by the memory model for this very review
//! reached the configured graduation threshold:
//!
//! | From       | Again      | Hard..Perfect                         |
//! |------------|------------|---------------------------------------|
//! | Learning   | Learning   | Review if graduates, else Learning    |
//! | Review     | Relearning | Review                                |
//! | Relearning | Relearning | Review if graduates, else Relearning  |

use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

use crate::error::EngineError;
use crate::memory::Stability;
use crate::types::rating::Rating;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum CardState {
    Learning = 0,
    Review = 1,
    Relearning = 2,
}

impl CardState {
    pub fn as_str(&self) -> &str {
        match self {
            CardState::Learning => "learning",
            CardState::Review => "review",
            CardState::Relearning => "relearning",
        }
    }

    /// The next state after a review rated `rating` that left the card with
    /// stability `new_stability`.
    pub fn transition(
        self,
        rating: Rating,
        new_stability: Stability,
        graduation_stability: Stability,
    ) -> CardState {
        let graduates = new_stability >= graduation_stability;
        match (self, rating) {
            (CardState::Learning, Rating::Again) => CardState::Learning,
            (CardState::Learning, _) if graduates => CardState::Review,
            (CardState::Learning, _) => CardState::Learning,
            (CardState::Review, Rating::Again) => CardState::Relearning,
            (CardState::Review, _) => CardState::Review,
            (CardState::Relearning, Rating::Again) => CardState::Relearning,
            (CardState::Relearning, _) if graduates => CardState::Review,
            (CardState::Relearning, _) => CardState::Relearning,
        }
    }
}

impl Display for CardState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<CardState> for i64 {
    fn from(s: CardState) -> i64 {
        s as i64
    }
}

impl TryFrom<i64> for CardState {
    type Error = EngineError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CardState::Learning),
            1 => Ok(CardState::Review),
            2 => Ok(CardState::Relearning),
            _ => Err(EngineError::CorruptCardState(format!(
                "unknown card state: {value}"
            ))),
        }
    }
}

/// Counters after a review: `reps` always grows by one, `lapses` only on
/// [`Rating::Again`].
pub fn next_counters(reps: u32, lapses: u32, rating: Rating) -> (u32, u32) {
    let lapses = if rating.is_lapse() {
        lapses.saturating_add(1)
    } else {
        lapses
    };
    (reps.saturating_add(1), lapses)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRADUATION: Stability = 2.0;
    const FRAGILE: Stability = 1.0;
    const DURABLE: Stability = 5.0;

    #[test]
    fn test_learning_transitions() {
        let s = CardState::Learning;
        assert_eq!(s.transition(Rating::Again, DURABLE, GRADUATION), CardState::Learning);
        assert_eq!(s.transition(Rating::Hard, FRAGILE, GRADUATION), CardState::Learning);
        for r in [Rating::Hard, Rating::Good, Rating::Easy, Rating::Perfect] {
            assert_eq!(s.transition(r, DURABLE, GRADUATION), CardState::Review);
        }
    }

    #[test]
    fn test_review_transitions() {
        let s = CardState::Review;
        assert_eq!(s.transition(Rating::Again, DURABLE, GRADUATION), CardState::Relearning);
        // A review card never falls back to learning, even when fragile.
        for r in [Rating::Hard, Rating::Good, Rating::Easy, Rating::Perfect] {
            assert_eq!(s.transition(r, FRAGILE, GRADUATION), CardState::Review);
        }
    }

    #[test]
    fn test_relearning_transitions() {
        let s = CardState::Relearning;
        assert_eq!(s.transition(Rating::Again, DURABLE, GRADUATION), CardState::Relearning);
        assert_eq!(s.transition(Rating::Good, FRAGILE, GRADUATION), CardState::Relearning);
        assert_eq!(s.transition(Rating::Good, GRADUATION, GRADUATION), CardState::Review);
    }

    #[test]
    fn test_counters() {
        assert_eq!(next_counters(0, 0, Rating::Perfect), (1, 0));
        assert_eq!(next_counters(4, 1, Rating::Again), (5, 2));
        for r in [Rating::Hard, Rating::Good, Rating::Easy] {
            assert_eq!(next_counters(2, 2, r), (3, 2));
        }
    }

    #[test]
    fn test_state_codes() {
        for state in [CardState::Learning, CardState::Review, CardState::Relearning] {
            assert_eq!(CardState::try_from(i64::from(state)), Ok(state));
        }
        assert!(matches!(
            CardState::try_from(7),
            Err(EngineError::CorruptCardState(_))
        ));
    }
}
