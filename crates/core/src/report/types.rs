use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::ticket::TicketClass;

/// Counts split by ticket class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PerClassCounts {
    pub sp: u64,
    pub se: u64,
    pub sg: u64,
}

impl PerClassCounts {
    pub fn bump(&mut self, class: TicketClass) {
        match class {
            TicketClass::Sp => self.sp += 1,
            TicketClass::Se => self.se += 1,
            TicketClass::Sg => self.sg += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.sp + self.se + self.sg
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Breakdown {
    pub total: u64,
    pub by_class: PerClassCounts,
}

impl From<PerClassCounts> for Breakdown {
    fn from(by_class: PerClassCounts) -> Self {
        Self {
            total: by_class.total(),
            by_class,
        }
    }
}

/// One ticket line in the daily report detail list.
#[derive(Debug, Clone, Serialize)]
pub struct TicketDetail {
    pub code: String,
    pub class: TicketClass,
    pub issued_at: DateTime<Utc>,
    pub counter: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub issued: Breakdown,
    pub called: Breakdown,
    pub discarded: Breakdown,
    pub details: Vec<TicketDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub issued: Breakdown,
    pub called: Breakdown,
    pub discarded: Breakdown,
}
