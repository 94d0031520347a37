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

use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::types::rating::Rating;

/// Upper bound for `max_interval_days` and `stability_max`: a hundred
/// years, so due dates stay inside four-digit years.
pub const MAX_INTERVAL_DAYS: f64 = 36500.0;

/// One value per rating.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingTable {
    pub again: f64,
    pub hard: f64,
    pub good: f64,
    pub easy: f64,
    pub perfect: f64,
}

impl RatingTable {
    pub fn get(&self, rating: Rating) -> f64 {
        match rating {
            Rating::Again => self.again,
            Rating::Hard => self.hard,
            Rating::Good => self.good,
            Rating::Easy => self.easy,
            Rating::Perfect => self.perfect,
        }
    }

    fn values(&self) -> [f64; 5] {
        [self.again, self.hard, self.good, self.easy, self.perfect]
    }
}

/// Stability growth multipliers for the successful ratings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuccessBonus {
    pub hard: f64,
    pub good: f64,
    pub easy: f64,
    pub perfect: f64,
}

impl SuccessBonus {
    /// The multiplier for a successful rating. `Again` has no growth.
    pub fn get(&self, rating: Rating) -> f64 {
        match rating {
            Rating::Again => 0.0,
            Rating::Hard => self.hard,
            Rating::Good => self.good,
            Rating::Easy => self.easy,
            Rating::Perfect => self.perfect,
        }
    }
}

/// Every tunable parameter of the memory model and state machine.
///
/// The defaults are calibrated FSRS weights extended with a fifth rating.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// The recall probability intervals aim for.
    pub target_recall: f64,
    /// Exponent of the power-law forgetting curve. Must be negative.
    pub decay: f64,
    pub stability_min: f64,
    pub stability_max: f64,
    pub difficulty_min: f64,
    pub difficulty_max: f64,
    /// Minimum stability for a card to leave (re)learning.
    pub graduation_stability: f64,
    /// Longest interval ever scheduled.
    pub max_interval_days: f64,
    pub initial_stability: RatingTable,
    pub initial_difficulty: RatingTable,
    /// Added to difficulty on each review, then clamped.
    pub difficulty_delta: RatingTable,
    pub success_bonus: SuccessBonus,
    pub growth_rate: f64,
    pub stability_exponent: f64,
    pub recall_sensitivity: f64,
    pub lapse_scale: f64,
    pub lapse_difficulty_exponent: f64,
    pub lapse_stability_exponent: f64,
    pub lapse_recall_sensitivity: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            target_recall: 0.9,
            decay: -0.5,
            stability_min: 0.1,
            stability_max: 36500.0,
            difficulty_min: 1.0,
            difficulty_max: 10.0,
            graduation_stability: 2.0,
            max_interval_days: 365.0,
            initial_stability: RatingTable {
                again: 0.40255,
                hard: 1.18385,
                good: 3.173,
                easy: 15.69105,
                perfect: 30.0,
            },
            initial_difficulty: RatingTable {
                again: 7.1949,
                hard: 6.48,
                good: 5.28,
                easy: 3.22,
                perfect: 2.0,
            },
            difficulty_delta: RatingTable {
                again: 2.9208,
                hard: 1.4604,
                good: 0.0,
                easy: -1.4604,
                perfect: -2.9208,
            },
            success_bonus: SuccessBonus {
                hard: 0.2315,
                good: 1.0,
                easy: 2.9898,
                perfect: 4.5,
            },
            growth_rate: 1.54575,
            stability_exponent: 0.1192,
            recall_sensitivity: 1.01925,
            lapse_scale: 1.9395,
            lapse_difficulty_exponent: 0.11,
            lapse_stability_exponent: 0.29605,
            lapse_recall_sensitivity: 2.2698,
        }
    }
}

impl SchedulerConfig {
    /// Parse a configuration from TOML. Missing fields take their defaults.
    pub fn from_toml(text: &str) -> Fallible<Self> {
        let config: SchedulerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter sets that would break the model's guarantees.
    pub fn validate(&self) -> Fallible<()> {
        let all_finite = [
            self.target_recall,
            self.decay,
            self.stability_min,
            self.stability_max,
            self.difficulty_min,
            self.difficulty_max,
            self.graduation_stability,
            self.max_interval_days,
            self.growth_rate,
            self.stability_exponent,
            self.recall_sensitivity,
            self.lapse_scale,
            self.lapse_difficulty_exponent,
            self.lapse_stability_exponent,
            self.lapse_recall_sensitivity,
        ]
        .into_iter()
        .chain(self.initial_stability.values())
        .chain(self.initial_difficulty.values())
        .chain(self.difficulty_delta.values())
        .all(f64::is_finite);
        if !all_finite {
            return fail("scheduler parameters must be finite numbers");
        }
        if !(self.target_recall > 0.0 && self.target_recall < 1.0) {
            return fail("target_recall must be strictly between 0 and 1");
        }
        if self.decay >= 0.0 {
            return fail("decay must be negative");
        }
        if !(self.stability_min > 0.0 && self.stability_min < self.stability_max) {
            return fail("stability bounds must satisfy 0 < stability_min < stability_max");
        }
        if !(self.difficulty_min > 0.0 && self.difficulty_min < self.difficulty_max) {
            return fail("difficulty bounds must satisfy 0 < difficulty_min < difficulty_max");
        }
        if !(1.0..=MAX_INTERVAL_DAYS).contains(&self.max_interval_days) {
            return fail(format!(
                "max_interval_days must be between 1 and {MAX_INTERVAL_DAYS}"
            ));
        }
        if self.stability_max > MAX_INTERVAL_DAYS {
            return fail(format!("stability_max must not exceed {MAX_INTERVAL_DAYS}"));
        }
        if self.graduation_stability < 0.0 {
            return fail("graduation_stability must not be negative");
        }
        if !is_sorted(&self.initial_stability.values(), |a, b| a <= b) {
            return fail("initial_stability must not decrease with the rating");
        }
        if !is_sorted(&self.difficulty_delta.values(), |a, b| a >= b) {
            return fail("difficulty_delta must not increase with the rating");
        }
        if !(self.difficulty_delta.again > 0.0 && self.difficulty_delta.perfect < 0.0) {
            return fail("difficulty_delta must be positive for again and negative for perfect");
        }
        let bonus = self.success_bonus;
        let bonuses = [bonus.hard, bonus.good, bonus.easy, bonus.perfect];
        if !bonuses.iter().all(|b| b.is_finite() && *b > 0.0) {
            return fail("success_bonus values must be positive");
        }
        if !is_sorted(&bonuses, |a, b| a < b) {
            return fail("success_bonus must strictly increase from hard to perfect");
        }
        if self.lapse_scale <= 0.0 {
            return fail("lapse_scale must be positive");
        }
        Ok(())
    }

    /// The constant that makes recall equal `target_recall` when elapsed time
    /// equals stability.
    pub fn curve_factor(&self) -> f64 {
        self.target_recall.powf(1.0 / self.decay) - 1.0
    }
}

fn is_sorted(values: &[f64], ordered: impl Fn(f64, f64) -> bool) -> bool {
    values.windows(2).all(|w| ordered(w[0], w[1]))
}
