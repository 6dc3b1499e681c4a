//! Core ticket data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Priority class of a ticket.
///
/// Three classes exist, carried through as the counter hall's historical
/// abbreviations. Nominal precedence is SP > SE > SG; the dispatcher bends
/// this with an alternation policy so SP backlogs cannot starve the others
/// (see [`crate::dispatch::Dispatcher`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketClass {
    /// Priority service (urgent).
    #[serde(rename = "SP")]
    Sp,
    /// Special service (elderly, legal priority).
    #[serde(rename = "SE")]
    Se,
    /// General service.
    #[serde(rename = "SG")]
    Sg,
}

impl TicketClass {
    /// All classes, in nominal precedence order.
    pub const ALL: [TicketClass; 3] = [TicketClass::Sp, TicketClass::Se, TicketClass::Sg];

    /// Returns the two-letter class code used in ticket codes and storage.
    pub fn code(&self) -> &'static str {
        match self {
            TicketClass::Sp => "SP",
            TicketClass::Se => "SE",
            TicketClass::Sg => "SG",
        }
    }

    /// Parse a class from its two-letter code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "SP" => Some(TicketClass::Sp),
            "SE" => Some(TicketClass::Se),
            "SG" => Some(TicketClass::Sg),
            _ => None,
        }
    }
}

impl std::fmt::Display for TicketClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Lifecycle state of a ticket.
///
/// Transitions are forward-only:
/// ```text
/// queued -> called -> served
///    \
///     -> discarded
/// ```
/// No state ever reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Issued, waiting to be called.
    Queued,
    /// Called to a counter, waiting to be served.
    Called,
    /// Service completed (terminal).
    Served,
    /// Removed from the queue without service (terminal).
    Discarded,
}

impl TicketStatus {
    /// Returns the status as its storage string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Queued => "queued",
            TicketStatus::Called => "called",
            TicketStatus::Served => "served",
            TicketStatus::Discarded => "discarded",
        }
    }

    /// Parse a status from its storage string.
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(TicketStatus::Queued),
            "called" => Some(TicketStatus::Called),
            "served" => Some(TicketStatus::Served),
            "discarded" => Some(TicketStatus::Discarded),
            _ => None,
        }
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Served | TicketStatus::Discarded)
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ticket representing one queue position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique identifier, assigned at creation.
    pub id: i64,

    /// Human-readable code, `YYMMDD-<class><seq3>`. Immutable once assigned;
    /// the sequence number is unique per (issue date, class).
    pub code: String,

    /// Priority class.
    pub class: TicketClass,

    /// When the ticket was issued.
    pub issued_at: DateTime<Utc>,

    /// Current lifecycle state.
    pub status: TicketStatus,

    /// Set exactly once, at the `queued -> called` transition.
    pub called_at: Option<DateTime<Utc>>,

    /// Set exactly once, at the `called -> served` transition.
    pub served_at: Option<DateTime<Utc>>,

    /// Service counter that called the ticket, set at the call transition.
    pub counter: Option<u32>,
}

/// Immutable audit record of one dispatch action.
///
/// Exactly one is appended per `queued -> called` transition. Code and class
/// are duplicated from the ticket for audit convenience. Never updated or
/// deleted; this is distinct from the ticket's own `called_at` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEvent {
    /// Unique identifier, assigned on append.
    pub id: i64,
    /// The ticket that was called.
    pub ticket_id: i64,
    /// Ticket code at call time.
    pub code: String,
    /// Ticket class at call time.
    pub class: TicketClass,
    /// Service counter the ticket was called to.
    pub counter: u32,
    /// When the call happened.
    pub called_at: DateTime<Utc>,
}
