//! SQLite-backed ticket store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, Transaction};

use super::{CallEvent, Ticket, TicketClass, TicketError, TicketStatus, TicketStore};

/// SQLite-backed ticket store.
///
/// Tickets and the call-event log share one connection so a claim and its
/// event commit atomically.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
}

impl SqliteTicketStore {
    /// Create a new SQLite ticket store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, TicketError> {
        let conn = Connection::open(path).map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite ticket store (useful for testing).
    pub fn in_memory() -> Result<Self, TicketError> {
        let conn =
            Connection::open_in_memory().map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TicketError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL,
                class TEXT NOT NULL,
                issued_at TEXT NOT NULL,
                status TEXT NOT NULL,
                called_at TEXT,
                served_at TEXT,
                counter INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_status_class ON tickets(status, class);
            CREATE INDEX IF NOT EXISTS idx_tickets_issued_at ON tickets(issued_at);

            CREATE TABLE IF NOT EXISTS calls (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticket_id INTEGER NOT NULL,
                code TEXT NOT NULL,
                class TEXT NOT NULL,
                counter INTEGER NOT NULL,
                called_at TEXT NOT NULL,
                FOREIGN KEY (ticket_id) REFERENCES tickets(id)
            );

            CREATE INDEX IF NOT EXISTS idx_calls_called_at ON calls(called_at);
            "#,
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(())
    }

    /// Timestamp encoding used for all columns. Millisecond precision keeps
    /// the strings compatible with SQLite's DATE()/strftime() functions.
    fn ts(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn parse_ts(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
    }

    fn parse_class(idx: usize, s: &str) -> rusqlite::Result<TicketClass> {
        TicketClass::from_code(s).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                format!("unknown ticket class: {}", s).into(),
            )
        })
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        let id: i64 = row.get(0)?;
        let code: String = row.get(1)?;
        let class_str: String = row.get(2)?;
        let issued_at_str: String = row.get(3)?;
        let status_str: String = row.get(4)?;
        let called_at_str: Option<String> = row.get(5)?;
        let served_at_str: Option<String> = row.get(6)?;
        let counter: Option<u32> = row.get(7)?;

        let class = Self::parse_class(2, &class_str)?;
        let issued_at = Self::parse_ts(3, &issued_at_str)?;
        let status = TicketStatus::from_str_opt(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                format!("unknown ticket status: {}", status_str).into(),
            )
        })?;
        let called_at = called_at_str
            .as_deref()
            .map(|s| Self::parse_ts(5, s))
            .transpose()?;
        let served_at = served_at_str
            .as_deref()
            .map(|s| Self::parse_ts(6, s))
            .transpose()?;

        Ok(Ticket {
            id,
            code,
            class,
            issued_at,
            status,
            called_at,
            served_at,
            counter,
        })
    }

    fn row_to_call(row: &rusqlite::Row) -> rusqlite::Result<CallEvent> {
        let id: i64 = row.get(0)?;
        let ticket_id: i64 = row.get(1)?;
        let code: String = row.get(2)?;
        let class_str: String = row.get(3)?;
        let counter: u32 = row.get(4)?;
        let called_at_str: String = row.get(5)?;

        Ok(CallEvent {
            id,
            ticket_id,
            code,
            class: Self::parse_class(3, &class_str)?,
            counter,
            called_at: Self::parse_ts(5, &called_at_str)?,
        })
    }

    const TICKET_COLUMNS: &'static str =
        "id, code, class, issued_at, status, called_at, served_at, counter";

    const CALL_COLUMNS: &'static str = "id, ticket_id, code, class, counter, called_at";

    fn oldest_queued_in_tx(
        tx: &Transaction,
        class: TicketClass,
    ) -> Result<Option<Ticket>, TicketError> {
        let result = tx.query_row(
            &format!(
                "SELECT {} FROM tickets WHERE class = ?1 AND status = 'queued' \
                 ORDER BY issued_at ASC, id ASC LIMIT 1",
                Self::TICKET_COLUMNS
            ),
            params![class.code()],
            Self::row_to_ticket,
        );

        match result {
            Ok(ticket) => Ok(Some(ticket)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(TicketError::Database(e.to_string())),
        }
    }

    /// Transition one ticket to `called` and append its call event.
    /// Runs inside the caller's transaction; both writes commit together.
    fn call_in_tx(tx: &Transaction, ticket: &Ticket, counter: u32) -> Result<Ticket, TicketError> {
        let now = Utc::now();

        tx.execute(
            "UPDATE tickets SET status = 'called', called_at = ?1, counter = ?2 WHERE id = ?3",
            params![Self::ts(&now), counter, ticket.id],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        tx.execute(
            "INSERT INTO calls (ticket_id, code, class, counter, called_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                ticket.id,
                ticket.code,
                ticket.class.code(),
                counter,
                Self::ts(&now),
            ],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(Ticket {
            status: TicketStatus::Called,
            called_at: Some(now),
            counter: Some(counter),
            ..ticket.clone()
        })
    }
}

impl TicketStore for SqliteTicketStore {
    fn create(&self, code: &str, class: TicketClass) -> Result<Ticket, TicketError> {
        let conn = self.conn.lock().unwrap();

        let now = Utc::now();
        conn.execute(
            "INSERT INTO tickets (code, class, issued_at, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                code,
                class.code(),
                Self::ts(&now),
                TicketStatus::Queued.as_str()
            ],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(Ticket {
            id: conn.last_insert_rowid(),
            code: code.to_string(),
            class,
            issued_at: now,
            status: TicketStatus::Queued,
            called_at: None,
            served_at: None,
            counter: None,
        })
    }

    fn get(&self, id: i64) -> Result<Option<Ticket>, TicketError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            &format!(
                "SELECT {} FROM tickets WHERE id = ?1",
                Self::TICKET_COLUMNS
            ),
            params![id],
            Self::row_to_ticket,
        );

        match result {
            Ok(ticket) => Ok(Some(ticket)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(TicketError::Database(e.to_string())),
        }
    }

    fn find_oldest_queued(&self, class: TicketClass) -> Result<Option<Ticket>, TicketError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            &format!(
                "SELECT {} FROM tickets WHERE class = ?1 AND status = 'queued' \
                 ORDER BY issued_at ASC, id ASC LIMIT 1",
                Self::TICKET_COLUMNS
            ),
            params![class.code()],
            Self::row_to_ticket,
        );

        match result {
            Ok(ticket) => Ok(Some(ticket)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(TicketError::Database(e.to_string())),
        }
    }

    fn count_queued(&self, class: TicketClass) -> Result<i64, TicketError> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            "SELECT COUNT(*) FROM tickets WHERE class = ?1 AND status = 'queued'",
            params![class.code()],
            |row| row.get(0),
        )
        .map_err(|e| TicketError::Database(e.to_string()))
    }

    fn mark_called(&self, id: i64, counter: u32) -> Result<Ticket, TicketError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let ticket = match tx.query_row(
            &format!(
                "SELECT {} FROM tickets WHERE id = ?1",
                Self::TICKET_COLUMNS
            ),
            params![id],
            Self::row_to_ticket,
        ) {
            Ok(t) => t,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Err(TicketError::NotFound(id)),
            Err(e) => return Err(TicketError::Database(e.to_string())),
        };

        let called = Self::call_in_tx(&tx, &ticket, counter)?;
        tx.commit()
            .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(called)
    }

    fn claim_next(
        &self,
        order: &[TicketClass],
        counter: u32,
    ) -> Result<Option<Ticket>, TicketError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut called = None;
        'classes: for &class in order {
            loop {
                let Some(ticket) = Self::oldest_queued_in_tx(&tx, class)? else {
                    // Class empty at probe time, fall through to the next one.
                    continue 'classes;
                };

                // Conditional claim: only a still-queued ticket may be taken.
                // A lost candidate means another claim got there first, so
                // retry the next candidate of the same class.
                let now = Utc::now();
                let changed = tx
                    .execute(
                        "UPDATE tickets SET status = 'called', called_at = ?1, counter = ?2 \
                         WHERE id = ?3 AND status = 'queued'",
                        params![Self::ts(&now), counter, ticket.id],
                    )
                    .map_err(|e| TicketError::Database(e.to_string()))?;
                if changed == 0 {
                    continue;
                }

                tx.execute(
                    "INSERT INTO calls (ticket_id, code, class, counter, called_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        ticket.id,
                        ticket.code,
                        ticket.class.code(),
                        counter,
                        Self::ts(&now),
                    ],
                )
                .map_err(|e| TicketError::Database(e.to_string()))?;

                called = Some(Ticket {
                    status: TicketStatus::Called,
                    called_at: Some(now),
                    counter: Some(counter),
                    ..ticket
                });
                break 'classes;
            }
        }

        tx.commit()
            .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(called)
    }

    fn mark_served(&self, id: i64) -> Result<bool, TicketError> {
        let conn = self.conn.lock().unwrap();

        let changed = conn
            .execute(
                "UPDATE tickets SET status = 'served', served_at = ?1 \
                 WHERE id = ?2 AND status = 'called'",
                params![Self::ts(&Utc::now()), id],
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(changed > 0)
    }

    fn mark_discarded(&self, id: i64) -> Result<bool, TicketError> {
        let conn = self.conn.lock().unwrap();

        let changed = conn
            .execute(
                "UPDATE tickets SET status = 'discarded' WHERE id = ?1 AND status = 'queued'",
                params![id],
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(changed > 0)
    }

    fn recent_calls(&self, limit: i64) -> Result<Vec<CallEvent>, TicketError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM calls ORDER BY called_at DESC, id DESC LIMIT ?1",
                Self::CALL_COLUMNS
            ))
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![limit], Self::row_to_call)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TicketError::Database(e.to_string()))
    }

    fn issued_on(&self, date: NaiveDate) -> Result<Vec<Ticket>, TicketError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM tickets WHERE DATE(issued_at) = ?1 ORDER BY issued_at ASC, id ASC",
                Self::TICKET_COLUMNS
            ))
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(
                params![date.format("%Y-%m-%d").to_string()],
                Self::row_to_ticket,
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TicketError::Database(e.to_string()))
    }

    fn calls_on(&self, date: NaiveDate) -> Result<Vec<CallEvent>, TicketError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM calls WHERE DATE(called_at) = ?1 ORDER BY called_at ASC, id ASC",
                Self::CALL_COLUMNS
            ))
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(
                params![date.format("%Y-%m-%d").to_string()],
                Self::row_to_call,
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TicketError::Database(e.to_string()))
    }

    fn issued_in_month(&self, year: i32, month: u32) -> Result<Vec<Ticket>, TicketError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM tickets \
                 WHERE strftime('%Y', issued_at) = ?1 AND strftime('%m', issued_at) = ?2 \
                 ORDER BY issued_at ASC, id ASC",
                Self::TICKET_COLUMNS
            ))
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(
                params![format!("{:04}", year), format!("{:02}", month)],
                Self::row_to_ticket,
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TicketError::Database(e.to_string()))
    }

    fn calls_in_month(&self, year: i32, month: u32) -> Result<Vec<CallEvent>, TicketError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM calls \
                 WHERE strftime('%Y', called_at) = ?1 AND strftime('%m', called_at) = ?2 \
                 ORDER BY called_at ASC, id ASC",
                Self::CALL_COLUMNS
            ))
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(
                params![format!("{:04}", year), format!("{:02}", month)],
                Self::row_to_call,
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TicketError::Database(e.to_string()))
    }
}
