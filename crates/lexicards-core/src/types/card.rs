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

use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

use crate::error::EngineError;
use crate::memory::Difficulty;
use crate::memory::Stability;
use crate::state::CardState;
use crate::types::timestamp::Timestamp;

/// The maximum length of a word, in characters.
pub const MAX_WORD_LEN: usize = 256;

/// The maximum length of a translation, in characters.
pub const MAX_TRANSLATION_LEN: usize = 1024;

/// The maximum number of context sentences on a card.
pub const MAX_CONTEXT_ENTRIES: usize = 32;

/// The maximum length of a user identifier, in characters.
pub const MAX_USER_ID_LEN: usize = 128;

/// Repository-assigned card identifier. Ids grow with creation order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(i64);

impl CardId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> i64 {
        self.0
    }
}

impl Display for CardId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Result<Self, EngineError> {
        let id: String = id.into();
        let id = id.trim();
        if id.is_empty() {
            return Err(EngineError::InvalidUser("user id is empty".to_string()));
        }
        if id.chars().count() > MAX_USER_ID_LEN {
            return Err(EngineError::InvalidUser(format!(
                "user id is longer than {MAX_USER_ID_LEN} characters"
            )));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        UserId::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> String {
        id.0
    }
}

/// Unvalidated content for a new card, as supplied by a caller.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CardInput {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub context: Option<Vec<String>>,
}

impl CardInput {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            ..Default::default()
        }
    }

    pub fn translation(mut self, t: impl Into<String>) -> Self {
        self.translation = Some(t.into());
        self
    }

    pub fn context(mut self, sentences: Vec<String>) -> Self {
        self.context = Some(sentences);
        self
    }

    /// Trim and check the input, producing card content.
    pub fn validate(self) -> Result<CardContent, EngineError> {
        let word = self.word.trim();
        if word.is_empty() {
            return Err(EngineError::InvalidCardData("word is empty".to_string()));
        }
        if word.chars().count() > MAX_WORD_LEN {
            return Err(EngineError::InvalidCardData(format!(
                "word is longer than {MAX_WORD_LEN} characters"
            )));
        }
        if word.contains('\n') {
            return Err(EngineError::InvalidCardData(
                "word spans multiple lines".to_string(),
            ));
        }
        let translation = self.translation.unwrap_or_default();
        let translation = translation.trim();
        if translation.chars().count() > MAX_TRANSLATION_LEN {
            return Err(EngineError::InvalidCardData(format!(
                "translation is longer than {MAX_TRANSLATION_LEN} characters"
            )));
        }
        let mut context = Vec::new();
        for sentence in self.context.unwrap_or_default() {
            let sentence = sentence.trim();
            if sentence.is_empty() {
                continue;
            }
            if sentence.contains('\n') {
                return Err(EngineError::InvalidCardData(
                    "context sentence spans multiple lines".to_string(),
                ));
            }
            context.push(sentence.to_string());
        }
        if context.len() > MAX_CONTEXT_ENTRIES {
            return Err(EngineError::InvalidCardData(format!(
                "more than {MAX_CONTEXT_ENTRIES} context sentences"
            )));
        }
        Ok(CardContent {
            word: word.to_string(),
            translation: translation.to_string(),
            context,
        })
    }
}

/// The learning material on a card. Never changed by scheduling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardContent {
    pub word: String,
    pub translation: String,
    pub context: Vec<String>,
}

impl CardContent {
    /// The context sentences in their stored, newline-delimited form.
    pub fn context_text(&self) -> String {
        self.context.join("\n")
    }

    /// Rebuild content from its stored form.
    pub fn from_stored(word: String, translation: String, context_text: &str) -> Self {
        let context = context_text
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| line.to_string())
            .collect();
        Self {
            word,
            translation,
            context,
        }
    }
}

/// The scheduling half of a card: everything a review rewrites.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub state: CardState,
    /// When the card becomes eligible for review.
    pub due: Timestamp,
    /// Days until recall probability falls to the target. Zero before the
    /// first review.
    pub stability: Stability,
    /// Intrinsic hardness. Zero before the first review.
    pub difficulty: Difficulty,
    /// Days between the previous review and the latest one.
    pub elapsed_days: f64,
    /// The interval planned at the latest review.
    pub scheduled_days: f64,
    pub reps: u32,
    pub lapses: u32,
    pub last_reviewed: Option<Timestamp>,
}

impl Schedule {
    /// The schedule of a card that has never been reviewed.
    pub fn new(created: Timestamp) -> Self {
        Self {
            state: CardState::Learning,
            due: created,
            stability: 0.0,
            difficulty: 0.0,
            elapsed_days: 0.0,
            scheduled_days: 0.0,
            reps: 0,
            lapses: 0,
            last_reviewed: None,
        }
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        self.due <= now
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub user: UserId,
    #[serde(flatten)]
    pub content: CardContent,
    pub created: Timestamp,
    #[serde(flatten)]
    pub schedule: Schedule,
}

impl Card {
    pub fn word(&self) -> &str {
        &self.content.word
    }

    pub fn translation(&self) -> &str {
        &self.content.translation
    }
}
