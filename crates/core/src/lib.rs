pub mod config;
pub mod dispatch;
pub mod metrics;
pub mod report;
pub mod sequence;
pub mod ticket;

pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use dispatch::Dispatcher;
pub use report::{DailyReport, MonthlyReport, Reporter};
pub use sequence::{SequenceAllocator, SequenceError, SqliteSequenceAllocator, TicketIssuer};
pub use ticket::{
    CallEvent, SqliteTicketStore, Ticket, TicketClass, TicketError, TicketStatus, TicketStore,
};
