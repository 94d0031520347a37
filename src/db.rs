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

use std::path::Path;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use lexicards_core::CardState;
use lexicards_core::error::EngineError;
use lexicards_core::error::ErrorReport;
use lexicards_core::error::Fallible;
use lexicards_core::repository::CardRepository;
use lexicards_core::repository::RepoResult;
use lexicards_core::repository::matches_query;
use lexicards_core::types::card::Card;
use lexicards_core::types::card::CardContent;
use lexicards_core::types::card::CardId;
use lexicards_core::types::card::Schedule;
use lexicards_core::types::card::UserId;
use lexicards_core::types::timestamp::Timestamp;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;

/// How long a statement waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
    create table if not exists users (
        id text primary key
    ) strict;

    create table if not exists cards (
        id integer primary key autoincrement,
        user_id text not null references users (id) on delete cascade,
        word text not null,
        translation text not null,
        context text not null,
        created_at text not null,
        state integer not null,
        due text not null,
        stability real not null,
        difficulty real not null,
        elapsed_days real not null,
        scheduled_days real not null,
        reps integer not null,
        lapses integer not null,
        last_reviewed_at text
    ) strict;

    create index if not exists cards_by_due on cards (user_id, due, id);
";

const CARD_COLUMNS: &str = "id, user_id, word, translation, context, created_at, state, due, \
     stability, difficulty, elapsed_days, scheduled_days, reps, lapses, last_reviewed_at";

/// A card row as stored, before domain validation.
struct CardRow {
    id: i64,
    user_id: String,
    word: String,
    translation: String,
    context: String,
    created_at: String,
    state: i64,
    due: String,
    stability: f64,
    difficulty: f64,
    elapsed_days: f64,
    scheduled_days: f64,
    reps: i64,
    lapses: i64,
    last_reviewed_at: Option<String>,
}

impl CardRow {
    fn read(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            word: row.get(2)?,
            translation: row.get(3)?,
            context: row.get(4)?,
            created_at: row.get(5)?,
            state: row.get(6)?,
            due: row.get(7)?,
            stability: row.get(8)?,
            difficulty: row.get(9)?,
            elapsed_days: row.get(10)?,
            scheduled_days: row.get(11)?,
            reps: row.get(12)?,
            lapses: row.get(13)?,
            last_reviewed_at: row.get(14)?,
        })
    }

    fn into_card(self) -> RepoResult<Card> {
        let id = CardId::new(self.id);
        let corrupt = |what: &str| EngineError::CorruptCardState(format!("card {id}: {what}"));
        let timestamp = |s: String, what: &str| Timestamp::try_from(s).map_err(|_| corrupt(what));
        let counter = |n: i64, what: &str| u32::try_from(n).map_err(|_| corrupt(what));
        let last_reviewed = match self.last_reviewed_at {
            Some(s) => Some(timestamp(s, "invalid last review timestamp")?),
            None => None,
        };
        Ok(Card {
            id,
            user: UserId::new(self.user_id).map_err(|_| corrupt("invalid user id"))?,
            content: CardContent::from_stored(self.word, self.translation, &self.context),
            created: timestamp(self.created_at, "invalid creation timestamp")?,
            schedule: Schedule {
                state: CardState::try_from(self.state).map_err(|_| corrupt("unknown state"))?,
                due: timestamp(self.due, "invalid due timestamp")?,
                stability: self.stability,
                difficulty: self.difficulty,
                elapsed_days: self.elapsed_days,
                scheduled_days: self.scheduled_days,
                reps: counter(self.reps, "negative reps")?,
                lapses: counter(self.lapses, "negative lapses")?,
                last_reviewed,
            },
        })
    }
}

/// Map a driver error onto the engine's error kinds. Values that cannot be
/// decoded are data faults; everything else is the store being unavailable.
fn db_error(e: rusqlite::Error) -> EngineError {
    match e {
        rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::IntegralValueOutOfRange(..) => {
            EngineError::CorruptCardState(e.to_string())
        }
        _ => EngineError::RepositoryUnavailable(e.to_string()),
    }
}

fn startup_error(e: rusqlite::Error) -> ErrorReport {
    ErrorReport::new(format!("Database error: {e}"))
}

/// Card storage in a SQLite database.
pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Fallible<Self> {
        let conn = Connection::open(path).map_err(startup_error)?;
        conn.execute_batch("pragma journal_mode = wal;")
            .map_err(startup_error)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Fallible<Self> {
        let conn = Connection::open_in_memory().map_err(startup_error)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Fallible<Self> {
        conn.busy_timeout(BUSY_TIMEOUT).map_err(startup_error)?;
        conn.execute_batch("pragma foreign_keys = on;")
            .map_err(startup_error)?;
        conn.execute_batch(SCHEMA).map_err(startup_error)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| EngineError::RepositoryUnavailable("connection lock poisoned".to_string()))
    }

    fn query_cards(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> RepoResult<Vec<Card>> {
        let mut stmt = conn.prepare_cached(sql).map_err(db_error)?;
        let rows = stmt
            .query_map(params, CardRow::read)
            .map_err(db_error)?
            .collect::<rusqlite::Result<Vec<CardRow>>>()
            .map_err(db_error)?;
        rows.into_iter().map(CardRow::into_card).collect()
    }

    fn fetch(conn: &Connection, user: &UserId, id: CardId) -> RepoResult<Option<Card>> {
        let sql = format!("select {CARD_COLUMNS} from cards where id = ?1 and user_id = ?2");
        let row = conn
            .query_row(&sql, params![id.into_inner(), user.as_str()], CardRow::read)
            .optional()
            .map_err(db_error)?;
        row.map(CardRow::into_card).transpose()
    }
}

impl CardRepository for SqliteRepository {
    fn ensure_user(&self, user: &UserId) -> RepoResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "insert or ignore into users (id) values (?1)",
            params![user.as_str()],
        )
        .map_err(db_error)?;
        Ok(())
    }

    fn delete_user(&self, user: &UserId) -> RepoResult<bool> {
        let conn = self.lock()?;
        let deleted = conn
            .execute("delete from users where id = ?1", params![user.as_str()])
            .map_err(db_error)?;
        Ok(deleted > 0)
    }

    fn create(
        &self,
        user: &UserId,
        content: &CardContent,
        created: Timestamp,
        schedule: &Schedule,
    ) -> RepoResult<Card> {
        let conn = self.lock()?;
        conn.execute(
            "insert into cards (user_id, word, translation, context, created_at, state, due, \
             stability, difficulty, elapsed_days, scheduled_days, reps, lapses, last_reviewed_at) \
             values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                user.as_str(),
                content.word,
                content.translation,
                content.context_text(),
                created.to_string(),
                i64::from(schedule.state),
                schedule.due.to_string(),
                schedule.stability,
                schedule.difficulty,
                schedule.elapsed_days,
                schedule.scheduled_days,
                schedule.reps,
                schedule.lapses,
                schedule.last_reviewed.map(|t| t.to_string()),
            ],
        )
        .map_err(db_error)?;
        Ok(Card {
            id: CardId::new(conn.last_insert_rowid()),
            user: user.clone(),
            content: content.clone(),
            created,
            schedule: *schedule,
        })
    }

    fn get_by_id(&self, user: &UserId, id: CardId) -> RepoResult<Option<Card>> {
        let conn = self.lock()?;
        Self::fetch(&conn, user, id)
    }

    fn get_due(&self, user: &UserId, now: Timestamp) -> RepoResult<Vec<Card>> {
        let conn = self.lock()?;
        let sql = format!(
            "select {CARD_COLUMNS} from cards where user_id = ?1 and due <= ?2 order by due, id"
        );
        Self::query_cards(&conn, &sql, params![user.as_str(), now.to_string()])
    }

    fn list(&self, user: &UserId) -> RepoResult<Vec<Card>> {
        let conn = self.lock()?;
        let sql = format!("select {CARD_COLUMNS} from cards where user_id = ?1 order by id");
        Self::query_cards(&conn, &sql, params![user.as_str()])
    }

    fn update(
        &self,
        user: &UserId,
        id: CardId,
        expected_reps: u32,
        schedule: &Schedule,
    ) -> RepoResult<Card> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "update cards set state = ?1, due = ?2, stability = ?3, difficulty = ?4, \
                 elapsed_days = ?5, scheduled_days = ?6, reps = ?7, lapses = ?8, \
                 last_reviewed_at = ?9 \
                 where id = ?10 and user_id = ?11 and reps = ?12",
                params![
                    i64::from(schedule.state),
                    schedule.due.to_string(),
                    schedule.stability,
                    schedule.difficulty,
                    schedule.elapsed_days,
                    schedule.scheduled_days,
                    schedule.reps,
                    schedule.lapses,
                    schedule.last_reviewed.map(|t| t.to_string()),
                    id.into_inner(),
                    user.as_str(),
                    expected_reps,
                ],
            )
            .map_err(db_error)?;
        if changed == 0 {
            return match Self::fetch(&conn, user, id)? {
                Some(_) => Err(EngineError::ConcurrentUpdate(id)),
                None => Err(EngineError::CardNotFound(id)),
            };
        }
        Self::fetch(&conn, user, id)?.ok_or(EngineError::CardNotFound(id))
    }

    fn delete(&self, user: &UserId, id: CardId) -> RepoResult<bool> {
        let conn = self.lock()?;
        let deleted = conn
            .execute(
                "delete from cards where id = ?1 and user_id = ?2",
                params![id.into_inner(), user.as_str()],
            )
            .map_err(db_error)?;
        Ok(deleted > 0)
    }

    fn search(&self, user: &UserId, query: &str) -> RepoResult<Vec<Card>> {
        // SQLite's lower() only folds ASCII, so filter here instead.
        let cards = self.list(user)?;
        Ok(cards
            .into_iter()
            .filter(|card| matches_query(card, query))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use lexicards_core::CardInput;
    use lexicards_core::repository::contract;
    use tempfile::tempdir;

    use super::*;

    fn memory_repo() -> SqliteRepository {
        SqliteRepository::open_in_memory().unwrap()
    }

    #[test]
    fn test_contract() {
        contract::run_all(memory_repo);
    }

    #[test]
    fn test_cards_survive_reopen() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("cards.db");
        let alice = contract::user("alice");
        let card = {
            let repo = SqliteRepository::open(&path)?;
            let created = contract::ts("2024-01-01T00:00:00.000Z");
            let content = CardInput::new("Schmetterling")
                .translation("butterfly")
                .context(vec![
                    "Ein Schmetterling fliegt.".to_string(),
                    "Schmetterlinge sind bunt.".to_string(),
                ])
                .validate()?;
            repo.ensure_user(&alice)?;
            repo.create(&alice, &content, created, &Schedule::new(created))?
        };
        let repo = SqliteRepository::open(&path)?;
        assert_eq!(repo.get_by_id(&alice, card.id)?, Some(card));
        Ok(())
    }

    #[test]
    fn test_fractional_values_are_preserved() -> Fallible<()> {
        let repo = memory_repo();
        let alice = contract::user("alice");
        let card = contract::add(&repo, &alice, "Wald", "2024-01-01T00:00:00.000Z");
        let last = contract::ts("2024-01-02T06:30:00.250Z");
        let schedule = Schedule {
            state: CardState::Relearning,
            due: last.plus_days(1.0).unwrap(),
            stability: 1.0556146153365165,
            difficulty: 8.2008,
            elapsed_days: 1.2711834490740741,
            scheduled_days: 1.0,
            reps: 2,
            lapses: 1,
            last_reviewed: Some(last),
        };
        let mut reviewed = schedule;
        reviewed.reps = 1;
        reviewed.lapses = 0;
        repo.update(&alice, card.id, 0, &reviewed)?;
        let updated = repo.update(&alice, card.id, 1, &schedule)?;
        assert_eq!(updated.schedule, schedule);
        assert_eq!(repo.get_by_id(&alice, card.id)?.map(|c| c.schedule), Some(schedule));
        Ok(())
    }

    #[test]
    fn test_unknown_user_cannot_create() {
        let repo = memory_repo();
        let created = contract::ts("2024-01-01T00:00:00.000Z");
        let content = CardInput::new("x").validate().unwrap();
        let nobody = contract::user("nobody");
        let result = repo.create(&nobody, &content, created, &Schedule::new(created));
        assert!(matches!(result, Err(EngineError::RepositoryUnavailable(_))));
    }

    #[test]
    fn test_undecodable_row_is_corrupt() -> Fallible<()> {
        let repo = memory_repo();
        let alice = contract::user("alice");
        let card = contract::add(&repo, &alice, "Fehler", "2024-01-01T00:00:00.000Z");
        {
            let conn = repo.lock()?;
            conn.execute(
                "update cards set due = 'next tuesday', state = 9 where id = ?1",
                params![card.id.into_inner()],
            )
            .map_err(startup_error)?;
        }
        let result = repo.get_by_id(&alice, card.id);
        assert!(matches!(result, Err(EngineError::CorruptCardState(_))));
        Ok(())
    }

    #[test]
    fn test_delete_user_cascades() -> Fallible<()> {
        let repo = memory_repo();
        let alice = contract::user("alice");
        contract::add(&repo, &alice, "eins", "2024-01-01T00:00:00.000Z");
        contract::add(&repo, &alice, "zwei", "2024-01-01T00:00:00.000Z");
        assert!(repo.delete_user(&alice)?);
        let conn = repo.lock()?;
        let remaining: i64 = conn
            .query_row("select count(*) from cards", [], |row| row.get(0))
            .map_err(startup_error)?;
        assert_eq!(remaining, 0);
        Ok(())
    }
}
