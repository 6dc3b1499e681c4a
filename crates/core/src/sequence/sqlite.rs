use std::path::Path;
use std::sync::Mutex;

use chrono::NaiveDate;
use rusqlite::{params, Connection};

use super::allocator::{SequenceAllocator, SequenceError};
use super::code::sequence_key;
use crate::ticket::TicketClass;

/// SQLite-backed sequence allocator.
///
/// One row per (date, class) lane, keyed like `260830-SP`. The increment is
/// a single upsert so concurrent issuers never see the same number twice.
pub struct SqliteSequenceAllocator {
    conn: Mutex<Connection>,
}

impl SqliteSequenceAllocator {
    pub fn new(path: &Path) -> Result<Self, SequenceError> {
        let conn = Connection::open(path).map_err(|e| SequenceError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self, SequenceError> {
        let conn =
            Connection::open_in_memory().map_err(|e| SequenceError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), SequenceError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sequences (
                key TEXT PRIMARY KEY,
                value INTEGER NOT NULL
            );
            "#,
        )
        .map_err(|e| SequenceError::Database(e.to_string()))?;

        Ok(())
    }
}

impl SequenceAllocator for SqliteSequenceAllocator {
    fn next(&self, class: TicketClass, date: NaiveDate) -> Result<u32, SequenceError> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            "INSERT INTO sequences (key, value) VALUES (?1, 1) \
             ON CONFLICT(key) DO UPDATE SET value = value + 1 \
             RETURNING value",
            params![sequence_key(class, date)],
            |row| row.get(0),
        )
        .map_err(|e| SequenceError::Database(e.to_string()))
    }
}
