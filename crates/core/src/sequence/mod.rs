mod allocator;
mod code;
mod issuer;
mod sqlite;

pub use allocator::{SequenceAllocator, SequenceError};
pub use code::{build_code, sequence_key};
pub use issuer::TicketIssuer;
pub use sqlite::SqliteSequenceAllocator;
