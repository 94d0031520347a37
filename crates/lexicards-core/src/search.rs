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

use crate::types::card::Card;

/// Default cap on search results.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// How closely a card matches a query. Earlier variants rank higher.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum MatchTier {
    Exact,
    Prefix,
    Substring,
}

/// The best tier at which `card`'s word or translation matches `query`.
/// `query` must already be lowercase.
pub fn match_tier(card: &Card, query: &str) -> Option<MatchTier> {
    [card.word(), card.translation()]
        .into_iter()
        .filter_map(|field| {
            let field = field.to_lowercase();
            if field == query {
                Some(MatchTier::Exact)
            } else if field.starts_with(query) {
                Some(MatchTier::Prefix)
            } else if field.contains(query) {
                Some(MatchTier::Substring)
            } else {
                None
            }
        })
        .min()
}

/// Order candidates exact match first, then prefix, then substring; newest
/// first within a tier. Keeps at most `limit` cards.
pub fn rank(cards: Vec<Card>, query: &str, limit: usize) -> Vec<Card> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    let mut ranked: Vec<(MatchTier, Card)> = cards
        .into_iter()
        .filter_map(|card| match_tier(&card, &query).map(|tier| (tier, card)))
        .collect();
    ranked.sort_by(|(ta, a), (tb, b)| {
        ta.cmp(tb)
            .then_with(|| b.created.cmp(&a.created))
            .then_with(|| b.id.cmp(&a.id))
    });
    ranked.into_iter().take(limit).map(|(_, card)| card).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::card::CardId;
    use crate::types::card::CardInput;
    use crate::types::card::Schedule;
    use crate::types::card::UserId;
    use crate::types::timestamp::Timestamp;

    fn card(id: i64, word: &str, translation: &str, created: &str) -> Card {
        let created = Timestamp::try_from(created.to_string()).unwrap();
        Card {
            id: CardId::new(id),
            user: UserId::new("alice").unwrap(),
            content: CardInput::new(word).translation(translation).validate().unwrap(),
            created,
            schedule: Schedule::new(created),
        }
    }

    fn words(cards: &[Card]) -> Vec<&str> {
        cards.iter().map(|c| c.word()).collect()
    }

    #[test]
    fn test_tiers() {
        let c = card(1, "Language", "Sprache", "2024-01-01T00:00:00.000Z");
        assert_eq!(match_tier(&c, "language"), Some(MatchTier::Exact));
        assert_eq!(match_tier(&c, "lang"), Some(MatchTier::Prefix));
        assert_eq!(match_tier(&c, "uage"), Some(MatchTier::Substring));
        assert_eq!(match_tier(&c, "sprache"), Some(MatchTier::Exact));
        assert_eq!(match_tier(&c, "orange"), None);
    }

    #[test]
    fn test_prefix_ranks_above_substring() {
        let cards = vec![
            card(1, "orange", "fruit; see lang. notes", "2024-01-03T00:00:00.000Z"),
            card(2, "language", "Sprache", "2024-01-01T00:00:00.000Z"),
            card(3, "lane", "Spur", "2024-01-02T00:00:00.000Z"),
        ];
        let ranked = rank(cards, "lang", 10);
        assert_eq!(words(&ranked), vec!["language", "orange"]);
    }

    #[test]
    fn test_exact_first_then_newest() {
        let cards = vec![
            card(1, "Haus", "house", "2024-01-01T00:00:00.000Z"),
            card(2, "Hausaufgabe", "homework", "2024-01-02T00:00:00.000Z"),
            card(3, "Haustür", "front door", "2024-01-03T00:00:00.000Z"),
            card(4, "Krankenhaus", "hospital", "2024-01-04T00:00:00.000Z"),
        ];
        let ranked = rank(cards, " HAUS ", 10);
        assert_eq!(
            words(&ranked),
            vec!["Haus", "Haustür", "Hausaufgabe", "Krankenhaus"]
        );
    }

    #[test]
    fn test_ties_fall_back_to_id() {
        let cards = vec![
            card(1, "tal", "valley", "2024-01-01T00:00:00.000Z"),
            card(2, "tale", "Märchen", "2024-01-01T00:00:00.000Z"),
            card(3, "talent", "Begabung", "2024-01-01T00:00:00.000Z"),
        ];
        let ranked = rank(cards, "tal", 10);
        assert_eq!(words(&ranked), vec!["tal", "talent", "tale"]);
    }

    #[test]
    fn test_limit_and_empty_query() {
        let cards: Vec<Card> = (0..20)
            .map(|i| card(i, &format!("word{i}"), "", "2024-01-01T00:00:00.000Z"))
            .collect();
        assert_eq!(rank(cards.clone(), "word", 5).len(), 5);
        assert!(rank(cards, "   ", 5).is_empty());
    }
}
