//! Database connection and key/value operations

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::migrations::run_migrations;
use crate::Result;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode so a second process reading the profile doesn't block writes
        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM local_storage WHERE key = ?1",
                    [key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value)
        })
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.set_items(&[(key, value)])
    }

    pub fn remove_item(&self, key: &str) -> Result<()> {
        self.remove_items(&[key])
    }

    /// Write several keys in one transaction. Either all land or none do.
    pub fn set_items(&self, items: &[(&str, &str)]) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();
        self.transaction(|conn| {
            for (key, value) in items {
                conn.execute(
                    "INSERT OR REPLACE INTO local_storage (key, value, updated_at) VALUES (?1, ?2, ?3)",
                    rusqlite::params![key, value, updated_at],
                )?;
            }
            Ok(())
        })
    }

    /// Remove several keys in one transaction. Missing keys are ignored.
    pub fn remove_items(&self, keys: &[&str]) -> Result<()> {
        self.transaction(|conn| {
            for key in keys {
                conn.execute("DELETE FROM local_storage WHERE key = ?1", [key])?;
            }
            Ok(())
        })
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        db.with_connection(|conn| {
            let count: i32 =
                conn.query_row("SELECT COUNT(*) FROM local_storage", [], |row| row.get(0))?;
            assert_eq!(count, 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_item_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get_item("ctai_token").unwrap(), None);

        db.set_item("ctai_token", "abc").unwrap();
        assert_eq!(db.get_item("ctai_token").unwrap().as_deref(), Some("abc"));

        db.set_item("ctai_token", "def").unwrap();
        assert_eq!(db.get_item("ctai_token").unwrap().as_deref(), Some("def"));

        db.remove_item("ctai_token").unwrap();
        assert_eq!(db.get_item("ctai_token").unwrap(), None);

        // Removing again is a no-op
        db.remove_item("ctai_token").unwrap();
    }

    #[test]
    fn test_multi_key_writes() {
        let db = Database::open_in_memory().unwrap();
        db.set_items(&[("a", "1"), ("b", "2")]).unwrap();
        assert_eq!(db.get_item("a").unwrap().as_deref(), Some("1"));
        assert_eq!(db.get_item("b").unwrap().as_deref(), Some("2"));

        db.remove_items(&["a", "b"]).unwrap();
        assert_eq!(db.get_item("a").unwrap(), None);
        assert_eq!(db.get_item("b").unwrap(), None);
    }

    #[test]
    fn test_failed_transaction_rolls_back() {
        let db = Database::open_in_memory().unwrap();
        db.set_item("ctai_user", "before").unwrap();

        let result: Result<()> = db.transaction(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO local_storage (key, value, updated_at) VALUES ('ctai_token', 'half', '')",
                [],
            )?;
            conn.execute(
                "UPDATE local_storage SET value = 'after' WHERE key = 'ctai_user'",
                [],
            )?;
            // Fails after both writes
            conn.execute("INSERT INTO missing_table VALUES (1)", [])?;
            Ok(())
        });

        assert!(result.is_err());
        assert_eq!(db.get_item("ctai_token").unwrap(), None);
        assert_eq!(db.get_item("ctai_user").unwrap().as_deref(), Some("before"));

        // The connection is usable again afterwards
        db.set_items(&[("ctai_token", "t"), ("ctai_user", "u")]).unwrap();
        assert_eq!(db.get_item("ctai_token").unwrap().as_deref(), Some("t"));
    }

    #[test]
    fn test_clones_share_connection() {
        let db = Database::open_in_memory().unwrap();
        let other = db.clone();
        db.set_item("k", "v").unwrap();
        assert_eq!(other.get_item("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_open_file_persists() {
        let dir = std::env::temp_dir().join(format!(
            "ctai-storage-test-{}-{}",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("ctai.db");

        {
            let db = Database::open(&path).unwrap();
            db.set_item("ctai_token", "persisted").unwrap();
        }

        let reopened = Database::open(&path).unwrap();
        assert_eq!(
            reopened.get_item("ctai_token").unwrap().as_deref(),
            Some("persisted")
        );

        drop(reopened);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
