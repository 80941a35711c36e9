//! SQLite-backed key-value store.
//!
//! Holds preference values and, between CLI invocations, the serialized
//! session (pending queue, run log and in-flight timer). Several processes
//! may share the file; session changes go through [`Database::update_session`].

use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

use super::{data_dir, KeyValueStore};
use crate::error::{DatabaseError, Result};
use crate::session::Session;

const SESSION_KEY: &str = "session";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite database at `<data dir>/timerqueue.db`.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database in the data directory.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("timerqueue.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Load the saved session, if any.
    ///
    /// A stored session that no longer parses is reported as an error so
    /// the caller can decide whether to start fresh.
    pub fn load_session(&self) -> Result<Option<Session>> {
        match self.kv_get(SESSION_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn save_session(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string(session)?;
        self.kv_set(SESSION_KEY, &json)?;
        Ok(())
    }

    /// Read-modify-write of the saved session under one `BEGIN IMMEDIATE`
    /// transaction, so concurrent writers never overwrite each other.
    ///
    /// `f` sees the latest stored session (fresh if absent or unreadable)
    /// and whatever it leaves behind is written back.
    pub fn update_session<R>(&self, f: impl FnOnce(&mut Session) -> R) -> Result<R> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let stored = tx
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![SESSION_KEY],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        let mut session = match stored {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "discarding unreadable saved session");
                Session::new()
            }),
            None => Session::new(),
        };

        let result = f(&mut session);

        let json = serde_json::to_string(&session)?;
        tx.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![SESSION_KEY, json],
        )?;
        tx.commit()?;
        Ok(result)
    }
}

impl KeyValueStore for Database {
    fn persist(&self, key: &str, value: &str) -> Result<()> {
        Ok(self.kv_set(key, value)?)
    }

    fn retrieve(&self, key: &str) -> Result<Option<String>> {
        Ok(self.kv_get(key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::TimerSpec;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }

    #[test]
    fn session_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timerqueue.db");

        let mut session = Session::new();
        session.queue.enqueue(TimerSpec::new("Boil eggs", 420_000).unwrap());
        {
            let db = Database::open_at(&path).unwrap();
            db.save_session(&session).unwrap();
        }

        let db = Database::open_at(&path).unwrap();
        let loaded = db.load_session().unwrap().unwrap();
        assert_eq!(loaded.queue.len(), 1);
        assert_eq!(loaded.queue.front().unwrap().label(), "Boil eggs");
    }

    #[test]
    fn updates_from_two_handles_both_land() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timerqueue.db");
        let runner = Database::open_at(&path).unwrap();
        let other = Database::open_at(&path).unwrap();

        let mut stale = Session::new();
        stale.queue.enqueue(TimerSpec::new("A", 60_000).unwrap());
        runner.save_session(&stale).unwrap();

        other
            .update_session(|session| session.queue.enqueue(TimerSpec::new("Late", 60_000).unwrap()))
            .unwrap();
        let len = runner
            .update_session(|session| {
                let front = session.queue.front().map(|spec| spec.id());
                if let Some(id) = front {
                    session.queue.remove(id);
                }
                session.queue.len()
            })
            .unwrap();

        assert_eq!(len, 1);
        let loaded = other.load_session().unwrap().unwrap();
        assert_eq!(loaded.queue.front().unwrap().label(), "Late");
    }

    #[test]
    fn update_starts_fresh_over_corrupt_session() {
        let db = Database::open_memory().unwrap();
        db.kv_set(SESSION_KEY, "{not json").unwrap();
        let queued = db
            .update_session(|session| {
                session.queue.enqueue(TimerSpec::new("Tea", 180_000).unwrap());
                session.queue.len()
            })
            .unwrap();
        assert_eq!(queued, 1);
        assert_eq!(db.load_session().unwrap().unwrap().queue.len(), 1);
    }

    #[test]
    fn corrupt_session_is_an_error() {
        let db = Database::open_memory().unwrap();
        db.kv_set(SESSION_KEY, "{not json").unwrap();
        assert!(db.load_session().is_err());
    }
}
