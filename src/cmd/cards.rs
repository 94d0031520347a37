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

//! One-shot card commands run against the database.

use lexicards_core::Card;
use lexicards_core::CardId;
use lexicards_core::CardInput;
use lexicards_core::Rating;
use lexicards_core::Timestamp;
use lexicards_core::error::Fallible;
use lexicards_core::error::fail;

use crate::cmd::AppEngine;
use crate::cmd::parse_user;

pub fn add_card(
    engine: &AppEngine,
    user: String,
    word: String,
    translation: Option<String>,
    context: Vec<String>,
) -> Fallible<()> {
    let user = parse_user(user)?;
    let mut input = CardInput::new(word);
    if let Some(translation) = translation {
        input = input.translation(translation);
    }
    if !context.is_empty() {
        input = input.context(context);
    }
    let card = engine.create_card(&user, input, Timestamp::now())?;
    println!("{}", serde_json::to_string_pretty(&card)?);
    Ok(())
}

pub fn list_due(engine: &AppEngine, user: String) -> Fallible<()> {
    let user = parse_user(user)?;
    let cards = engine.get_due_cards(&user, Timestamp::now())?;
    if cards.is_empty() {
        println!("No cards due.");
        return Ok(());
    }
    print!("{}", card_table(&cards));
    Ok(())
}

pub fn answer(engine: &AppEngine, user: String, id: i64, rating: i64) -> Fallible<()> {
    let user = parse_user(user)?;
    let rating = Rating::try_from(rating)?;
    let card = engine.answer_card(&user, CardId::new(id), rating, Timestamp::now())?;
    println!("{}", serde_json::to_string_pretty(&card)?);
    Ok(())
}

pub fn search(engine: &AppEngine, user: String, query: String) -> Fallible<()> {
    let user = parse_user(user)?;
    let cards = engine.search_similar(&user, &query)?;
    if cards.is_empty() {
        println!("No matching cards.");
        return Ok(());
    }
    print!("{}", card_table(&cards));
    Ok(())
}

pub fn delete_card(engine: &AppEngine, user: String, id: i64) -> Fallible<()> {
    let user = parse_user(user)?;
    engine.delete_card(&user, CardId::new(id))?;
    println!("Deleted card {id}.");
    Ok(())
}

pub fn delete_user(engine: &AppEngine, user: String) -> Fallible<()> {
    let user = parse_user(user)?;
    if !engine.delete_user(&user)? {
        return fail(format!("no such user: {user}"));
    }
    println!("Deleted user {user}.");
    Ok(())
}

/// Render cards as a plain-text table.
fn card_table(cards: &[Card]) -> String {
    let mut out = format!(
        "{:>6}  {:<24}  {:<10}  {}\n",
        "ID", "DUE", "STATE", "WORD"
    );
    for card in cards {
        let word = if card.translation().is_empty() {
            card.word().to_string()
        } else {
            format!("{} ({})", card.word(), card.translation())
        };
        out.push_str(&format!(
            "{:>6}  {:<24}  {:<10}  {}\n",
            card.id.to_string(),
            card.schedule.due.to_string(),
            card.schedule.state.to_string(),
            word
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use lexicards_core::CachedRepository;
    use lexicards_core::CardRepository;
    use lexicards_core::Engine;
    use lexicards_core::MemoryRepository;
    use lexicards_core::SchedulerConfig;
    use lexicards_core::UserId;

    use super::*;

    fn engine() -> AppEngine {
        let repo: Box<dyn CardRepository> =
            Box::new(CachedRepository::new(MemoryRepository::new()));
        Engine::new(repo, SchedulerConfig::default())
    }

    #[test]
    fn test_card_table() -> Fallible<()> {
        let engine = engine();
        let user = UserId::new("alice")?;
        let now = Timestamp::try_from("2024-03-01T08:00:00.000Z".to_string())?;
        let card = engine.create_card(&user, CardInput::new("Baum").translation("tree"), now)?;
        let table = card_table(&[card]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("WORD"));
        assert!(lines[1].contains("2024-03-01T08:00:00.000Z"));
        assert!(lines[1].contains("learning"));
        assert!(lines[1].ends_with("Baum (tree)"));
        Ok(())
    }

    #[test]
    fn test_commands() -> Fallible<()> {
        let engine = engine();
        add_card(
            &engine,
            "alice".to_string(),
            "Haus".to_string(),
            Some("house".to_string()),
            vec!["Das Haus ist alt.".to_string()],
        )?;
        let user = UserId::new("alice")?;
        let card = engine.search_similar(&user, "haus")?.remove(0);
        assert_eq!(card.content.context, vec!["Das Haus ist alt."]);
        answer(&engine, "alice".to_string(), card.id.into_inner(), 3)?;
        assert_eq!(engine.get_card(&user, card.id)?.schedule.reps, 1);
        assert!(answer(&engine, "alice".to_string(), card.id.into_inner(), 6).is_err());
        delete_card(&engine, "alice".to_string(), card.id.into_inner())?;
        assert!(delete_card(&engine, "alice".to_string(), card.id.into_inner()).is_err());
        delete_user(&engine, "alice".to_string())?;
        assert!(delete_user(&engine, "alice".to_string()).is_err());
        assert!(add_card(&engine, " ".to_string(), "x".to_string(), None, vec![]).is_err());
        Ok(())
    }
}
