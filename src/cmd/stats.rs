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

use clap::ValueEnum;
use lexicards_core::Stats;
use lexicards_core::Timestamp;
use lexicards_core::error::Fallible;

use crate::cmd::AppEngine;
use crate::cmd::parse_user;

#[derive(ValueEnum, Clone, Copy, PartialEq, Debug)]
pub enum StatsFormat {
    /// Human-readable text.
    Text,
    /// A JSON object.
    Json,
}

impl Display for StatsFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsFormat::Text => write!(f, "text"),
            StatsFormat::Json => write!(f, "json"),
        }
    }
}

pub fn print_stats(engine: &AppEngine, user: String, format: StatsFormat) -> Fallible<()> {
    let user = parse_user(user)?;
    let stats = engine.get_stats(&user, Timestamp::now())?;
    println!("{}", render_stats(&stats, format)?);
    Ok(())
}

fn render_stats(stats: &Stats, format: StatsFormat) -> Fallible<String> {
    match format {
        StatsFormat::Json => Ok(serde_json::to_string_pretty(stats)?),
        StatsFormat::Text => Ok(format!(
            "Total cards: {}\nDue now:     {}\nLearning:    {}\nReview:      {}\nRelearning:  {}",
            stats.total, stats.due, stats.learning, stats.review, stats.relearning
        )),
    }
}
