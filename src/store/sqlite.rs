use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};

use crate::app::{Result, StrandError};
use crate::domain::{Actor, FollowedActor, Note, Sort};
use crate::store::{NoteFilter, PageQuery, Store};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| StrandError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            StrandError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn order_clause(sort: Sort) -> &'static str {
        match sort {
            Sort::Latest => "ORDER BY published DESC, id DESC",
            Sort::Oldest => "ORDER BY published ASC, id ASC",
            Sort::Random => "ORDER BY RANDOM()",
        }
    }

    fn decode_note(data: String) -> rusqlite::Result<Note> {
        serde_json::from_str(&data).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
    }

    fn insert_note(conn: &Connection, note: &Note) -> Result<usize> {
        let data = serde_json::to_string(note)?;
        let changed = conn.execute(
            "INSERT INTO notes (id, attributed_to, published, in_reply_to, data, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                attributed_to = excluded.attributed_to,
                published = excluded.published,
                in_reply_to = excluded.in_reply_to,
                data = excluded.data,
                fetched_at = excluded.fetched_at",
            params![
                note.id,
                note.attributed_to,
                note.published.map(|dt| dt.to_rfc3339()),
                note.in_reply_to,
                data,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(changed)
    }
}

impl Store for SqliteStore {
    fn put_note(&self, note: &Note) -> Result<()> {
        let conn = self.conn()?;
        Self::insert_note(&conn, note)?;
        Ok(())
    }

    fn put_notes(&self, notes: &[Note]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut count = 0;

        for note in notes {
            count += Self::insert_note(&tx, note)?;
        }

        tx.commit()?;
        Ok(count)
    }

    fn get_note(&self, id: &str) -> Result<Option<Note>> {
        let conn = self.conn()?;

        let result = conn
            .query_row("SELECT data FROM notes WHERE id = ?1", params![id], |row| {
                Self::decode_note(row.get(0)?)
            })
            .optional()?;

        Ok(result)
    }

    fn search_notes(&self, filter: &NoteFilter, query: &PageQuery) -> Result<Vec<Note>> {
        let conn = self.conn()?;

        let (condition, arg) = match filter {
            NoteFilter::Following => (
                "attributed_to IN (SELECT url FROM followed_actors
                                   UNION SELECT actor_id FROM followed_actors WHERE actor_id IS NOT NULL)",
                None,
            ),
            NoteFilter::Replies(id) => ("in_reply_to = ?3", Some(id.as_str())),
        };

        let sql = format!(
            "SELECT data FROM notes WHERE {} {} LIMIT ?1 OFFSET ?2",
            condition,
            Self::order_clause(query.sort)
        );
        let mut stmt = conn.prepare(&sql)?;

        let limit = query.limit as i64;
        let skip = query.skip as i64;
        let decode = |row: &rusqlite::Row<'_>| Self::decode_note(row.get(0)?);
        let rows = match arg {
            Some(id) => stmt.query_map(params![limit, skip, id], decode)?,
            None => stmt.query_map(params![limit, skip], decode)?,
        };

        let notes = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    fn count_notes(&self) -> Result<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn put_actor(&self, actor: &Actor) -> Result<()> {
        let conn = self.conn()?;
        let data = serde_json::to_string(actor)?;

        conn.execute(
            "INSERT INTO actors (id, data, fetched_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data, fetched_at = excluded.fetched_at",
            params![actor.id, data, Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }

    fn get_actor(&self, id: &str) -> Result<Option<Actor>> {
        let conn = self.conn()?;

        let data: Option<String> = conn
            .query_row(
                "SELECT a.data FROM actors a
                 WHERE a.id = ?1
                    OR a.id = (SELECT actor_id FROM followed_actors WHERE url = ?1)",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        match data {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    fn follow(&self, url: &str) -> Result<bool> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO followed_actors (url, followed_at) VALUES (?1, ?2)",
            params![url, Utc::now().to_rfc3339()],
        )?;
        Ok(inserted > 0)
    }

    fn unfollow(&self, url: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM followed_actors WHERE url = ?1", params![url])?;
        Ok(deleted > 0)
    }

    fn link_followed(&self, url: &str, actor_id: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE followed_actors SET actor_id = ?2 WHERE url = ?1",
            params![url, actor_id],
        )?;
        Ok(())
    }

    fn followed_actors(&self) -> Result<Vec<FollowedActor>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare("SELECT url FROM followed_actors ORDER BY followed_at, url")?;
        let actors = stmt
            .query_map([], |row| Ok(FollowedActor { url: row.get(0)? }))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(actors)
    }
}
