//! Ticket code formatting.
//!
//! Codes look like `260830-SP001`: the issue date as YYMMDD, the class code
//! and the zero-padded per-lane sequence number.

use chrono::NaiveDate;

use crate::ticket::TicketClass;

/// Counter table key for a (date, class) lane, e.g. `260830-SP`.
pub fn sequence_key(class: TicketClass, date: NaiveDate) -> String {
    format!("{}-{}", date.format("%y%m%d"), class.code())
}

/// Ticket code shown to visitors, e.g. `260830-SP001`.
///
/// Padding is a display minimum. A lane past 999 keeps counting with four
/// digits rather than wrapping.
pub fn build_code(class: TicketClass, date: NaiveDate, seq: u32) -> String {
    format!("{}-{}{:03}", date.format("%y%m%d"), class.code(), seq)
}
