mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteTicketStore;
pub use store::{TicketError, TicketStore};
pub use types::{CallEvent, Ticket, TicketClass, TicketStatus};
