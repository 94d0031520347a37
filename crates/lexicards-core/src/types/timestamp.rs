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

use chrono::DateTime;
use chrono::Datelike;
use chrono::Duration;
use chrono::SubsecRound;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;

const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// The last year a four-digit timestamp can hold.
const MAX_YEAR: i32 = 9999;

/// Shifts beyond this many milliseconds (ten thousand years) never land in
/// range.
const MAX_SHIFT_MILLIS: f64 = 10_000.0 * 366.0 * MILLIS_PER_DAY;

/// A UTC instant with millisecond precision.
///
/// The text form is fixed-width, so string order equals time order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn new(dt: DateTime<Utc>) -> Self {
        Self(dt.trunc_subsecs(3))
    }

    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }

    /// The current instant.
    #[cfg(feature = "clock")]
    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    /// This instant shifted forward by a (possibly fractional) number of days.
    /// `None` if the result falls outside years 0 to 9999, which the text
    /// form cannot carry.
    pub fn plus_days(self, days: f64) -> Option<Self> {
        let millis = days * MILLIS_PER_DAY;
        if !millis.is_finite() || millis.abs() > MAX_SHIFT_MILLIS {
            return None;
        }
        let shifted = self
            .0
            .checked_add_signed(Duration::milliseconds(millis.round() as i64))?;
        if !(0..=MAX_YEAR).contains(&shifted.year()) {
            return None;
        }
        Some(Self::new(shifted))
    }

    /// Days elapsed from `earlier` to this instant. Negative if `earlier` is
    /// actually later.
    pub fn days_since(self, earlier: Timestamp) -> f64 {
        (self.0 - earlier.0).num_milliseconds() as f64 / MILLIS_PER_DAY
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(FORMAT))
    }
}

impl TryFrom<String> for Timestamp {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let dt = DateTime::parse_from_rfc3339(&value)
            .map_err(|_| ErrorReport::new(format!("Failed to parse timestamp: '{value}'.")))?;
        Ok(Timestamp::new(dt.with_timezone(&Utc)))
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> String {
        ts.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::try_from(s.to_string()).unwrap()
    }

    #[test]
    fn test_timestamp_to_string() {
        let ts = ts("2023-10-05T14:30:15.123Z");
        assert_eq!(ts.to_string(), "2023-10-05T14:30:15.123Z");
    }

    #[test]
    fn test_offsets_are_normalized_to_utc() {
        let ts = ts("2023-10-05T16:30:15.123+02:00");
        assert_eq!(ts.to_string(), "2023-10-05T14:30:15.123Z");
    }

    #[test]
    fn test_invalid_string() {
        assert!(Timestamp::try_from("yesterday".to_string()).is_err());
    }

    #[test]
    fn test_day_arithmetic() {
        let start = ts("2024-01-01T00:00:00.000Z");
        let later = start.plus_days(1.5).unwrap();
        assert_eq!(later.to_string(), "2024-01-02T12:00:00.000Z");
        assert_eq!(later.days_since(start), 1.5);
        assert_eq!(start.days_since(later), -1.5);
    }

    #[test]
    fn test_shift_out_of_range() {
        let start = ts("2024-01-01T00:00:00.000Z");
        assert_eq!(start.plus_days(1e9), None);
        assert_eq!(start.plus_days(3_000_000.0), None);
        assert_eq!(start.plus_days(-1e6), None);
        assert_eq!(start.plus_days(f64::NAN), None);
        assert_eq!(start.plus_days(f64::INFINITY), None);
        let last = ts("9999-12-30T00:00:00.000Z");
        let end = last.plus_days(1.0).unwrap();
        assert_eq!(end.to_string(), "9999-12-31T00:00:00.000Z");
        assert_eq!(Timestamp::try_from(end.to_string()).unwrap(), end);
        assert_eq!(last.plus_days(2.0), None);
    }

    #[test]
    fn test_string_order_matches_time_order() {
        let a = ts("2024-01-09T23:59:59.999Z");
        let b = ts("2024-01-10T00:00:00.000Z");
        assert!(a < b);
        assert!(a.to_string() < b.to_string());
    }

    #[test]
    fn test_serialize() {
        let ts = ts("2023-10-05T14:30:15.123Z");
        let serialized = serde_json::to_string(&ts).unwrap();
        assert_eq!(serialized, "\"2023-10-05T14:30:15.123Z\"");
        let back: Timestamp = serde_json::from_str(&serialized).unwrap();
        assert_eq!(back, ts);
    }
}
