use chrono::NaiveDate;
use thiserror::Error;

use crate::ticket::TicketClass;

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("database error: {0}")]
    Database(String),
}

/// Hands out the next dense sequence number for a (date, class) lane.
///
/// Numbering starts at 1 and never skips within a lane. Each lane advances
/// independently, so SP002 can exist while SG is still on SG001.
pub trait SequenceAllocator: Send + Sync {
    fn next(&self, class: TicketClass, date: NaiveDate) -> Result<u32, SequenceError>;
}
