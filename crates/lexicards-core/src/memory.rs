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

//! The memory model: pure functions from a card's memory state and a rating
//! to its next memory state and interval.

use crate::config::SchedulerConfig;
use crate::error::EngineError;
use crate::types::rating::Rating;

pub type Recall = f64;
pub type Stability = f64;
pub type Difficulty = f64;
pub type Interval = f64;

/// The memory state of a card going into a review.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MemoryState {
    /// Zero if the card has never been reviewed.
    pub stability: Stability,
    pub difficulty: Difficulty,
    /// Days since the previous review.
    pub elapsed_days: Interval,
}

/// The memory state of a card coming out of a review.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MemoryOutcome {
    pub stability: Stability,
    pub difficulty: Difficulty,
    /// Whole days until the next review.
    pub scheduled_days: Interval,
}

/// Probability of recall after `t` days at stability `s`.
pub fn retrievability(config: &SchedulerConfig, t: Interval, s: Stability) -> Recall {
    (1.0 + config.curve_factor() * (t / s)).powf(config.decay)
}

/// Days until recall falls to `config.target_recall`.
pub fn interval(config: &SchedulerConfig, s: Stability) -> Interval {
    let factor = config.curve_factor();
    (s / factor) * (config.target_recall.powf(1.0 / config.decay) - 1.0)
}

/// The interval actually scheduled: whole days, at least one, at most the
/// configured maximum.
pub fn scheduled_interval(config: &SchedulerConfig, s: Stability) -> Interval {
    interval(config, s).round().clamp(1.0, config.max_interval_days)
}

pub fn initial_stability(config: &SchedulerConfig, r: Rating) -> Stability {
    clamp_s(config, config.initial_stability.get(r))
}

pub fn initial_difficulty(config: &SchedulerConfig, r: Rating) -> Difficulty {
    clamp_d(config, config.initial_difficulty.get(r))
}

pub fn new_difficulty(config: &SchedulerConfig, d: Difficulty, r: Rating) -> Difficulty {
    clamp_d(config, d + config.difficulty_delta.get(r))
}

fn s_success(
    config: &SchedulerConfig,
    d: Difficulty,
    s: Stability,
    r: Recall,
    g: Rating,
) -> Stability {
    let t_d = config.difficulty_max + 1.0 - d;
    let t_s = s.powf(-config.stability_exponent);
    let t_r = f64::exp(config.recall_sensitivity * (1.0 - r)) - 1.0;
    let b = config.success_bonus.get(g);
    let c = f64::exp(config.growth_rate);
    let alpha = 1.0 + t_d * t_s * t_r * b * c;
    s * alpha
}

fn s_fail(config: &SchedulerConfig, d: Difficulty, s: Stability, r: Recall) -> Stability {
    let d_f = d.powf(-config.lapse_difficulty_exponent);
    let s_f = (s + 1.0).powf(config.lapse_stability_exponent) - 1.0;
    let r_f = f64::exp(config.lapse_recall_sensitivity * (1.0 - r));
    let s_f = d_f * s_f * r_f * config.lapse_scale;
    f64::min(s_f, s)
}

pub fn new_stability(
    config: &SchedulerConfig,
    d: Difficulty,
    s: Stability,
    r: Recall,
    g: Rating,
) -> Stability {
    let s = if g.is_lapse() {
        s_fail(config, d, s, r)
    } else {
        s_success(config, d, s, r, g)
    };
    clamp_s(config, s)
}

fn clamp_s(config: &SchedulerConfig, s: Stability) -> Stability {
    s.clamp(config.stability_min, config.stability_max)
}

fn clamp_d(config: &SchedulerConfig, d: Difficulty) -> Difficulty {
    d.clamp(config.difficulty_min, config.difficulty_max)
}

/// Run one review through the model.
///
/// A card with zero stability is taking its first review and is seeded from
/// the per-rating tables. Anything else follows the forgetting curve.
pub fn review(
    config: &SchedulerConfig,
    state: MemoryState,
    rating: Rating,
) -> Result<MemoryOutcome, EngineError> {
    let MemoryState {
        stability,
        difficulty,
        elapsed_days,
    } = state;
    if !stability.is_finite() || stability < 0.0 {
        return Err(EngineError::CorruptCardState(format!(
            "stability out of range: {stability}"
        )));
    }
    if !elapsed_days.is_finite() || elapsed_days < 0.0 {
        return Err(EngineError::CorruptCardState(format!(
            "elapsed days out of range: {elapsed_days}"
        )));
    }
    let (stability, difficulty) = if stability == 0.0 {
        (
            initial_stability(config, rating),
            initial_difficulty(config, rating),
        )
    } else {
        if !difficulty.is_finite()
            || difficulty < config.difficulty_min
            || difficulty > config.difficulty_max
        {
            return Err(EngineError::CorruptCardState(format!(
                "difficulty out of range: {difficulty}"
            )));
        }
        let r: Recall = retrievability(config, elapsed_days, stability);
        (
            new_stability(config, difficulty, stability, r, rating),
            new_difficulty(config, difficulty, rating),
        )
    };
    Ok(MemoryOutcome {
        stability,
        difficulty,
        scheduled_days: scheduled_interval(config, stability),
    })
}
