mod reporter;
mod types;

pub use reporter::Reporter;
pub use types::{Breakdown, DailyReport, MonthlyReport, PerClassCounts, TicketDetail};
