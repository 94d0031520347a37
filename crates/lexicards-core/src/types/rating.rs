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
use serde_json::Value;

use crate::error::EngineError;

/// How well the user recalled a card, on a closed five-point scale.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Rating {
    Again = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
    Perfect = 5,
}

impl Rating {
    pub const ALL: [Rating; 5] = [
        Rating::Again,
        Rating::Hard,
        Rating::Good,
        Rating::Easy,
        Rating::Perfect,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
            Rating::Perfect => "perfect",
        }
    }

    /// Whether this rating means the card was forgotten.
    pub fn is_lapse(self) -> bool {
        self == Rating::Again
    }
}

impl TryFrom<i64> for Rating {
    type Error = EngineError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Rating::Again),
            2 => Ok(Rating::Hard),
            3 => Ok(Rating::Good),
            4 => Ok(Rating::Easy),
            5 => Ok(Rating::Perfect),
            _ => Err(EngineError::InvalidRating(value.to_string())),
        }
    }
}

/// Decode a rating from an untyped JSON value. Anything but an integer in
/// range, including a missing value, is an invalid rating.
impl TryFrom<&Value> for Rating {
    type Error = EngineError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value.as_i64() {
            Some(n) => Rating::try_from(n),
            None => Err(EngineError::InvalidRating(value.to_string())),
        }
    }
}

impl From<Rating> for i64 {
    fn from(r: Rating) -> i64 {
        r as i64
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_rating_from_integer() {
        for (i, rating) in (1..=5).zip(Rating::ALL) {
            assert_eq!(Rating::try_from(i), Ok(rating));
            assert_eq!(i64::from(rating), i);
        }
    }

    #[test]
    fn test_out_of_range_rating() {
        for i in [-1, 0, 6, 100] {
            assert_eq!(Rating::try_from(i), Err(EngineError::InvalidRating(i.to_string())));
        }
    }

    #[test]
    fn test_rating_from_json_value() {
        assert_eq!(Rating::try_from(&json!(4)), Ok(Rating::Easy));
        for value in [json!(2.5), json!("3"), json!(null), json!([3]), json!(7)] {
            assert!(matches!(
                Rating::try_from(&value),
                Err(EngineError::InvalidRating(_))
            ));
        }
        assert_eq!(
            Rating::try_from(&json!("3")),
            Err(EngineError::InvalidRating("\"3\"".to_string()))
        );
    }

    #[test]
    fn test_rating_serialization_format() {
        assert_eq!(serde_json::to_string(&Rating::Perfect).unwrap(), "5");
        let r: Rating = serde_json::from_str("2").unwrap();
        assert_eq!(r, Rating::Hard);
        assert!(serde_json::from_str::<Rating>("0").is_err());
    }

    #[test]
    fn test_ordering() {
        assert!(Rating::Again < Rating::Hard);
        assert!(Rating::Easy < Rating::Perfect);
        assert!(Rating::Again.is_lapse());
        assert!(!Rating::Hard.is_lapse());
    }
}
