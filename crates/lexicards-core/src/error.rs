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

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;

use crate::types::card::CardId;

#[derive(Debug, PartialEq)]
pub struct ErrorReport {
    message: String,
}

impl ErrorReport {
    pub fn new(msg: impl Into<String>) -> Self {
        ErrorReport {
            message: msg.into(),
        }
    }
}

impl From<std::io::Error> for ErrorReport {
    fn from(value: std::io::Error) -> Self {
        ErrorReport {
            message: format!("I/O error: {value:#?}"),
        }
    }
}

impl From<serde_json::Error> for ErrorReport {
    fn from(value: serde_json::Error) -> Self {
        ErrorReport {
            message: format!("JSON error: {value:#?}"),
        }
    }
}

impl From<toml::de::Error> for ErrorReport {
    fn from(value: toml::de::Error) -> Self {
        ErrorReport {
            message: format!("Config error: {value}"),
        }
    }
}

impl From<EngineError> for ErrorReport {
    fn from(value: EngineError) -> Self {
        ErrorReport {
            message: value.to_string(),
        }
    }
}

impl Display for ErrorReport {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "error: {}", self.message)
    }
}

impl Error for ErrorReport {
    fn description(&self) -> &str {
        &self.message
    }
}

pub type Fallible<T> = Result<T, ErrorReport>;

pub fn fail<T>(msg: impl Into<String>) -> Fallible<T> {
    Err(ErrorReport {
        message: msg.into(),
    })
}

/// Errors surfaced by the scheduling engine and the repositories behind it.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Card content was missing or malformed at creation time.
    InvalidCardData(String),
    /// A rating that is not an integer in `1..=5`. Carries the value as
    /// given.
    InvalidRating(String),
    /// A user identifier that is empty or too long.
    InvalidUser(String),
    /// No such card for this user.
    CardNotFound(CardId),
    /// A stored card violates a scheduling invariant. Never repaired.
    CorruptCardState(String),
    /// Another answer for the same card was persisted first.
    ConcurrentUpdate(CardId),
    /// The backing store failed or timed out. Safe to retry.
    RepositoryUnavailable(String),
}

impl EngineError {
    /// The name of the error kind, as reported over the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidCardData(_) => "InvalidCardData",
            EngineError::InvalidRating(_) => "InvalidRating",
            EngineError::InvalidUser(_) => "InvalidUser",
            EngineError::CardNotFound(_) => "CardNotFound",
            EngineError::CorruptCardState(_) => "CorruptCardState",
            EngineError::ConcurrentUpdate(_) => "ConcurrentUpdate",
            EngineError::RepositoryUnavailable(_) => "RepositoryUnavailable",
        }
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::RepositoryUnavailable(_) | EngineError::ConcurrentUpdate(_)
        )
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidCardData(msg) => write!(f, "invalid card data: {msg}"),
            EngineError::InvalidRating(r) => {
                write!(f, "invalid rating: {r} (expected an integer from 1 to 5)")
            }
            EngineError::InvalidUser(msg) => write!(f, "invalid user: {msg}"),
            EngineError::CardNotFound(id) => write!(f, "card not found: {id}"),
            EngineError::CorruptCardState(msg) => write!(f, "corrupt card state: {msg}"),
            EngineError::ConcurrentUpdate(id) => {
                write!(f, "card {id} was updated concurrently, reload and retry")
            }
            EngineError::RepositoryUnavailable(msg) => write!(f, "repository unavailable: {msg}"),
        }
    }
}

impl Error for EngineError {}
