use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use super::allocator::SequenceAllocator;
use super::code::build_code;
use crate::metrics::TICKETS_ISSUED;
use crate::ticket::{Ticket, TicketClass, TicketError, TicketStore};

/// Issues new queue tickets: draws the next number for today's lane, builds
/// the visitor-facing code and persists the ticket as queued.
pub struct TicketIssuer {
    allocator: Arc<dyn SequenceAllocator>,
    store: Arc<dyn TicketStore>,
}

impl TicketIssuer {
    pub fn new(allocator: Arc<dyn SequenceAllocator>, store: Arc<dyn TicketStore>) -> Self {
        Self { allocator, store }
    }

    pub fn issue(&self, class: TicketClass) -> Result<Ticket, TicketError> {
        let today = Utc::now().date_naive();
        let seq = self.allocator.next(class, today)?;
        let code = build_code(class, today, seq);

        let ticket = self.store.create(&code, class)?;
        TICKETS_ISSUED.with_label_values(&[class.code()]).inc();
        debug!(code = %ticket.code, class = %class, "issued ticket");

        Ok(ticket)
    }
}
