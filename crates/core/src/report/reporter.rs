use std::sync::Arc;

use chrono::NaiveDate;

use super::types::{Breakdown, DailyReport, MonthlyReport, PerClassCounts, TicketDetail};
use crate::ticket::{CallEvent, Ticket, TicketError, TicketStatus, TicketStore};

/// Computes issuance and call reports from the store.
///
/// Issued counts come from ticket rows, called counts from the call-event
/// log, so a ticket called twice by hand shows up twice in the called
/// figures. Discarded counts the issued tickets currently in that state.
pub struct Reporter {
    store: Arc<dyn TicketStore>,
}

impl Reporter {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }

    pub fn daily(&self, date: NaiveDate) -> Result<DailyReport, TicketError> {
        let issued = self.store.issued_on(date)?;
        let calls = self.store.calls_on(date)?;

        let mut details: Vec<TicketDetail> = issued
            .iter()
            .map(|t| TicketDetail {
                code: t.code.clone(),
                class: t.class,
                issued_at: t.issued_at,
                counter: t.counter,
            })
            .collect();
        details.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));

        Ok(DailyReport {
            date,
            issued: Self::issued_breakdown(&issued),
            called: Self::called_breakdown(&calls),
            discarded: Self::discarded_breakdown(&issued),
            details,
        })
    }

    pub fn monthly(&self, year: i32, month: u32) -> Result<MonthlyReport, TicketError> {
        let issued = self.store.issued_in_month(year, month)?;
        let calls = self.store.calls_in_month(year, month)?;

        Ok(MonthlyReport {
            year,
            month,
            issued: Self::issued_breakdown(&issued),
            called: Self::called_breakdown(&calls),
            discarded: Self::discarded_breakdown(&issued),
        })
    }

    fn issued_breakdown(tickets: &[Ticket]) -> Breakdown {
        let mut counts = PerClassCounts::default();
        for ticket in tickets {
            counts.bump(ticket.class);
        }
        counts.into()
    }

    fn called_breakdown(calls: &[CallEvent]) -> Breakdown {
        let mut counts = PerClassCounts::default();
        for call in calls {
            counts.bump(call.class);
        }
        counts.into()
    }

    fn discarded_breakdown(tickets: &[Ticket]) -> Breakdown {
        let mut counts = PerClassCounts::default();
        for ticket in tickets {
            if ticket.status == TicketStatus::Discarded {
                counts.bump(ticket.class);
            }
        }
        counts.into()
    }
}
