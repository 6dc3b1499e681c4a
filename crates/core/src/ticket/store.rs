//! Ticket storage trait and error types.

use chrono::NaiveDate;
use thiserror::Error;

use super::{CallEvent, Ticket, TicketClass};
use crate::sequence::SequenceError;

/// Error type for ticket operations.
#[derive(Debug, Error)]
pub enum TicketError {
    /// Operation targets a ticket id that does not exist.
    #[error("ticket not found: {0}")]
    NotFound(i64),

    /// Sequence allocation failed while issuing.
    #[error("sequence allocation failed: {0}")]
    Sequence(#[from] SequenceError),

    /// Store-level failure. Not retried by the core; propagates to the
    /// caller as fatal for the request.
    #[error("database error: {0}")]
    Database(String),
}

/// Trait for ticket storage backends.
///
/// Owns both Ticket records and the append-only call-event log; the two
/// must live in the same backend so a claim and its call event commit as
/// one unit.
pub trait TicketStore: Send + Sync {
    /// Persist a new queued ticket with the given code and class.
    fn create(&self, code: &str, class: TicketClass) -> Result<Ticket, TicketError>;

    /// Get a ticket by id.
    fn get(&self, id: i64) -> Result<Option<Ticket>, TicketError>;

    /// The single queued ticket of `class` with the earliest `issued_at`,
    /// ties broken by id ascending. Never returns non-queued tickets.
    fn find_oldest_queued(&self, class: TicketClass) -> Result<Option<Ticket>, TicketError>;

    /// Number of tickets currently queued for `class`.
    fn count_queued(&self, class: TicketClass) -> Result<i64, TicketError>;

    /// Transition a ticket to `called` and append its call event, as one
    /// transaction. Fails with [`TicketError::NotFound`] if the id does not
    /// exist. State policy (only queued tickets may be called) is the
    /// dispatcher's responsibility and is not re-validated here.
    fn mark_called(&self, id: i64, counter: u32) -> Result<Ticket, TicketError>;

    /// Claim the oldest queued ticket of the first non-empty class in
    /// `order`, transitioning it to `called` and appending exactly one call
    /// event before returning. The probe and claim for every candidate run
    /// inside a single transaction; a candidate that is no longer queued at
    /// claim time is skipped in favour of the next one. Returns `None` when
    /// every class in `order` is empty.
    fn claim_next(
        &self,
        order: &[TicketClass],
        counter: u32,
    ) -> Result<Option<Ticket>, TicketError>;

    /// Transition `called -> served`, setting `served_at`. Returns whether a
    /// row changed; false (already served, never called, or unknown id) is a
    /// no-op, which keeps finishing idempotent.
    fn mark_served(&self, id: i64) -> Result<bool, TicketError>;

    /// Transition `queued -> discarded`. Returns whether a row changed;
    /// false is a no-op, same idempotency contract as [`mark_served`].
    ///
    /// [`mark_served`]: TicketStore::mark_served
    fn mark_discarded(&self, id: i64) -> Result<bool, TicketError>;

    /// Call events, most recent first.
    fn recent_calls(&self, limit: i64) -> Result<Vec<CallEvent>, TicketError>;

    /// Tickets issued on a calendar date. Read-only; zero rows is fine.
    fn issued_on(&self, date: NaiveDate) -> Result<Vec<Ticket>, TicketError>;

    /// Call events on a calendar date.
    fn calls_on(&self, date: NaiveDate) -> Result<Vec<CallEvent>, TicketError>;

    /// Tickets issued in a calendar month.
    fn issued_in_month(&self, year: i32, month: u32) -> Result<Vec<Ticket>, TicketError>;

    /// Call events in a calendar month.
    fn calls_in_month(&self, year: i32, month: u32) -> Result<Vec<CallEvent>, TicketError>;
}
