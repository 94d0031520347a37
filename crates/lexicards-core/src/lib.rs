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

//! lexicards-core: Core library for the lexicards vocabulary trainer.
//!
//! This library provides the scheduling side of the application:
//! - The memory model (stability, difficulty and interval computation)
//! - The card state machine (Learning / Review / Relearning)
//! - The scheduling engine and the repository contract it depends on
//! - An in-memory repository and a write-invalidated caching decorator

pub mod config;
pub mod engine;
pub mod error;
pub mod memory;
pub mod repository;
pub mod search;
pub mod state;
pub mod types;

// Re-exports for convenience
pub use config::SchedulerConfig;
pub use engine::{Engine, Stats};
pub use error::{EngineError, ErrorReport, Fallible, fail};
pub use repository::CardRepository;
pub use repository::cache::CachedRepository;
pub use repository::memory::MemoryRepository;
pub use state::CardState;
pub use types::card::{Card, CardContent, CardId, CardInput, Schedule, UserId};
pub use types::rating::Rating;
pub use types::timestamp::Timestamp;
